use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Certificate metadata for listing and auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Subject common name
    pub subject: String,
    /// Issuer common name
    pub issuer: String,
    /// Serial number (hex)
    pub serial: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// SHA-256 of the DER encoding (lowercase hex)
    pub fingerprint: String,
}

impl CertificateInfo {
    /// Is the certificate outside its validity window at `now`?
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after || now < self.not_before
    }

    /// Fingerprint as colon-separated uppercase pairs, the way
    /// `openssl x509 -fingerprint` prints it
    #[must_use]
    pub fn fingerprint_display(&self) -> String {
        self.fingerprint
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(":")
    }
}
