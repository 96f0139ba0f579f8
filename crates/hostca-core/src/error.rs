use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CA operations
pub type Result<T> = std::result::Result<T, CaError>;

/// Errors that can occur while evaluating, signing, storing or cleaning
/// host certificates
#[derive(Error, Debug)]
pub enum CaError {
    /// The CSR text could not be parsed or its signature did not verify
    #[error("malformed certificate request: {0}")]
    MalformedRequest(String),

    /// A hostname is empty or not usable as a certificate subject
    #[error("invalid hostname: {0:?}")]
    InvalidHostname(String),

    /// The certificate engine refused the request or failed to sign it
    #[error("signing failed: {0}")]
    Signing(String),

    /// Reading or writing persisted certificate material failed
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        /// File or directory that was being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No persisted material exists for the host
    #[error("no certificate material found for {hostname}")]
    NotFound {
        /// Host that was looked up
        hostname: String,
    },

    /// The host already holds a signed certificate; clean it first
    #[error("{hostname} already has a signed certificate")]
    AlreadySigned {
        /// Host that was already issued
        hostname: String,
    },

    /// The CA's own key or certificate is missing or unusable
    #[error("CA identity error: {0}")]
    Identity(String),

    /// A stored certificate could not be parsed
    #[error("certificate parse error: {0}")]
    CertParse(String),

    /// Settings are invalid or could not be read
    #[error("configuration error: {0}")]
    Config(String),
}

impl CaError {
    /// Wrap an I/O error with the path it happened on
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for [`CaError::NotFound`]
    pub fn not_found(hostname: impl Into<String>) -> Self {
        Self::NotFound {
            hostname: hostname.into(),
        }
    }

    /// Returns true for the benign "nothing to do" outcome of a clean
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if the caller sent something the CA will never accept
    /// as-is (as opposed to a failure on the CA side)
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedRequest(_) | Self::InvalidHostname(_) | Self::AlreadySigned { .. }
        )
    }
}
