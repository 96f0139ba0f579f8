//! The CA's own key and certificate.

use tracing::{info, warn};

use hostca_core::Result;

use crate::engine::{CertificateEngine, IssueParams};
use crate::store::FileStore;

/// CA signing key and self-signed certificate.
///
/// Created once (or loaded from the store) when the CA starts and never
/// modified afterwards.
#[derive(Clone)]
pub struct CaIdentity {
    name: String,
    certificate_pem: String,
    key_pem: String,
}

impl CaIdentity {
    pub fn new(
        name: impl Into<String>,
        certificate_pem: impl Into<String>,
        key_pem: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            certificate_pem: certificate_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    /// Load the CA from `store`, generating and saving a new one if the
    /// store has none yet.
    pub fn load_or_create(
        store: &FileStore,
        engine: &dyn CertificateEngine,
        name: &str,
        validity_days: u32,
    ) -> Result<Self> {
        if let Some((certificate_pem, key_pem)) = store.load_ca()? {
            let name = match engine.inspect(&certificate_pem) {
                Ok(info) => info.subject,
                Err(e) => {
                    warn!(error = %e, "could not read CA certificate subject, using configured name");
                    name.to_string()
                }
            };
            return Ok(Self::new(name, certificate_pem, key_pem));
        }

        info!(name, root = %store.root().display(), "generating CA");
        let serial = store.next_serial()?;
        let identity = engine.generate_ca(&IssueParams::new(name, serial, validity_days)?)?;
        store.save_ca(&identity.certificate_pem, &identity.key_pem)?;
        Ok(identity)
    }

    /// CA common name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// CA certificate (PEM)
    #[must_use]
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// CA private key (PEM)
    #[must_use]
    pub fn key_pem(&self) -> &str {
        &self.key_pem
    }
}

impl std::fmt::Debug for CaIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaIdentity")
            .field("name", &self.name)
            .field("key_pem", &"<redacted>")
            .finish_non_exhaustive()
    }
}
