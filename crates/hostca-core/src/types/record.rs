use serde::{Deserialize, Serialize};

/// Everything the CA has persisted for one host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCertificateRecord {
    /// Store key and certificate subject
    pub hostname: String,

    /// Pending certificate request (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csr: Option<String>,

    /// Signed certificate (PEM). Once present it is returned verbatim until
    /// the host is cleaned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    /// Private key, only held for hosts issued locally by the CA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl HostCertificateRecord {
    /// Create an empty record for a host
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Attach a certificate request
    #[must_use]
    pub fn with_csr(mut self, csr: impl Into<String>) -> Self {
        self.csr = Some(csr.into());
        self
    }

    /// Attach a signed certificate
    #[must_use]
    pub fn with_certificate(mut self, certificate: impl Into<String>) -> Self {
        self.certificate = Some(certificate.into());
        self
    }

    /// Attach a private key
    #[must_use]
    pub fn with_private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    /// True once a certificate has been signed for this host
    #[must_use]
    pub const fn is_issued(&self) -> bool {
        self.certificate.is_some()
    }

    /// True if a request is waiting for an operator
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.csr.is_some() && self.certificate.is_none()
    }
}

/// Outcome of a `getcert` call that did not fail.
///
/// Rejections (malformed requests, signing or storage failures) are the
/// `Err` side of `getcert`, so an absent certificate here always means
/// "waiting for an operator" and never "something went wrong".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CertResponse {
    /// The host holds a signed certificate
    Issued {
        /// Host certificate (PEM)
        certificate: String,
        /// CA certificate (PEM)
        ca_certificate: String,
    },
    /// The request was filed and awaits manual signing
    Pending {
        /// CA certificate (PEM)
        ca_certificate: String,
    },
}

impl CertResponse {
    /// The host certificate, if one was issued
    #[must_use]
    pub fn certificate(&self) -> Option<&str> {
        match self {
            Self::Issued { certificate, .. } => Some(certificate),
            Self::Pending { .. } => None,
        }
    }

    /// The CA certificate, present in both outcomes
    #[must_use]
    pub fn ca_certificate(&self) -> &str {
        match self {
            Self::Issued { ca_certificate, .. } | Self::Pending { ca_certificate } => {
                ca_certificate
            }
        }
    }

    #[must_use]
    pub const fn is_issued(&self) -> bool {
        matches!(self, Self::Issued { .. })
    }

    /// Flatten into the wire pair `(cert_text, ca_cert_text)`; an empty
    /// `cert_text` means pending.
    #[must_use]
    pub fn into_texts(self) -> (String, String) {
        match self {
            Self::Issued {
                certificate,
                ca_certificate,
            } => (certificate, ca_certificate),
            Self::Pending { ca_certificate } => (String::new(), ca_certificate),
        }
    }
}
