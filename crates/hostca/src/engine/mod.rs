//! Certificate engine: the cryptographic primitives the CA relies on.
//!
//! Policy, storage and idempotence never touch key material directly; they
//! go through [`CertificateEngine`], so tests can swap in a fake signer.

mod native;

use chrono::{DateTime, Datelike, Utc};

use hostca_core::{CaError, CertificateInfo, Result};

use crate::CaIdentity;

pub use native::RcgenEngine;

/// Last year an X.509 `GeneralizedTime` can express.
pub const MAX_VALIDITY_YEAR: i32 = 9999;

/// A parsed certificate signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Common name claimed by the requester
    pub subject: String,
    /// The request exactly as submitted (PEM)
    pub pem: String,
}

/// What to put in a certificate besides the subject key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueParams {
    /// Subject common name (and DNS SAN for host certificates)
    pub common_name: String,
    /// Serial number
    pub serial: u64,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
}

impl IssueParams {
    /// Validity starting a day in the past, to absorb agent clock skew.
    ///
    /// Fails with `Signing` if the window ends past what a certificate can
    /// encode.
    pub fn new(common_name: impl Into<String>, serial: u64, validity_days: u32) -> Result<Self> {
        let now = Utc::now();
        let not_after = chrono::Duration::try_days(i64::from(validity_days))
            .and_then(|validity| now.checked_add_signed(validity))
            .filter(|at| at.year() <= MAX_VALIDITY_YEAR)
            .ok_or_else(|| {
                CaError::Signing(format!("validity of {validity_days} days is out of range"))
            })?;

        Ok(Self {
            common_name: common_name.into(),
            serial,
            not_before: now - chrono::Duration::days(1),
            not_after,
        })
    }
}

/// Signing, parsing and key generation.
pub trait CertificateEngine: Send + Sync {
    /// Parse and verify a PEM certificate request.
    ///
    /// Fails with `MalformedRequest` for anything that is not a well-formed,
    /// self-consistent request with a subject common name.
    fn parse_request(&self, csr_pem: &str) -> Result<SigningRequest>;

    /// Sign `request` with the CA key, returning the certificate PEM.
    fn sign(&self, request: &SigningRequest, ca: &CaIdentity, params: &IssueParams)
        -> Result<String>;

    /// Create a fresh self-signed CA.
    fn generate_ca(&self, params: &IssueParams) -> Result<CaIdentity>;

    /// Create a key pair and a request for `hostname`, returned as
    /// `(private_key_pem, csr_pem)`.
    fn generate_request(&self, hostname: &str) -> Result<(String, String)>;

    /// Summarize a PEM certificate.
    fn inspect(&self, certificate_pem: &str) -> Result<CertificateInfo>;
}
