//! Request-handling entry point for agents.

use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

use hostca_core::{validate_hostname, CertResponse, Result};

use crate::autosign::AutosignSetting;
use crate::config::CaSettings;
use crate::engine::CertificateEngine;
use crate::issuer::CertificateAuthority;

/// Ties the autosign policy to the issuer for inbound requests.
#[derive(Debug)]
pub struct CaService {
    ca: CertificateAuthority,
    autosign: AutosignSetting,
}

impl CaService {
    pub fn new(ca: CertificateAuthority, autosign: AutosignSetting) -> Self {
        Self { ca, autosign }
    }

    /// Open the CA described by `settings`. When `server_name` is set, the
    /// master's own certificate is issued now if it does not exist yet.
    pub fn open(settings: &CaSettings, engine: Arc<dyn CertificateEngine>) -> Result<Self> {
        let ca = CertificateAuthority::open(settings, engine)?;
        if let Some(server_name) = &settings.server_name {
            ca.ensure_host_certificate(server_name)?;
        }
        Ok(Self::new(ca, AutosignSetting::new(settings.autosign.clone())))
    }

    #[must_use]
    pub const fn ca(&self) -> &CertificateAuthority {
        &self.ca
    }

    /// Handle to the live autosign setting; changes apply to the next request.
    #[must_use]
    pub const fn autosign_setting(&self) -> &AutosignSetting {
        &self.autosign
    }

    /// Would `hostname` be signed without an operator right now?
    #[must_use]
    pub fn autosign(&self, hostname: &str) -> bool {
        self.autosign.autosign(hostname)
    }

    /// Answer an agent's certificate request.
    ///
    /// The request subject is the identity being certified. `client` is the
    /// name the agent connected as and, like `ip`, only goes to the logs.
    /// An issued certificate is returned verbatim and never re-signed. If
    /// the policy does not allow signing, the request is filed for an
    /// operator and the answer is [`CertResponse::Pending`]. Unparsable
    /// requests and invalid hostnames are errors and leave no trace.
    pub fn getcert(
        &self,
        csr_text: &str,
        client: Option<&str>,
        ip: Option<IpAddr>,
    ) -> Result<CertResponse> {
        let request = self.ca.parse_request(csr_text)?;
        let hostname = validate_hostname(&request.subject)?;
        if let Some(client) = client.filter(|client| *client != hostname) {
            info!(hostname, client, ip = ?ip, "request subject differs from client name");
        }
        let ca_certificate = self.ca.ca_certificate().to_string();

        let store = self.ca.store();
        let _guard = store.lock(hostname);

        if let Some(certificate) = store.certificate(hostname)? {
            debug!(hostname, ip = ?ip, "returning issued certificate");
            return Ok(CertResponse::Issued {
                certificate,
                ca_certificate,
            });
        }

        if !self.autosign.autosign(hostname) {
            store.save_request(hostname, csr_text)?;
            info!(hostname, ip = ?ip, "certificate request pending");
            return Ok(CertResponse::Pending { ca_certificate });
        }

        let signed = self.ca.sign(&request, hostname)?;
        self.ca.commit(&signed, None)?;
        info!(hostname, ip = ?ip, serial = signed.serial, "autosigned certificate request");

        Ok(CertResponse::Issued {
            certificate: signed.certificate,
            ca_certificate,
        })
    }

    /// Remove everything held for `hostname`; see [`CertificateAuthority::clean`].
    pub fn clean(&self, hostname: &str) -> Result<()> {
        self.ca.clean(hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RcgenEngine;
    use hostca_core::{AutosignConfig, CaError};
    use tempfile::TempDir;

    fn service(dir: &TempDir, autosign: AutosignConfig) -> CaService {
        let settings = CaSettings {
            cadir: dir.path().join("ca"),
            autosign,
            ..CaSettings::default()
        };
        CaService::open(&settings, Arc::new(RcgenEngine::new())).unwrap()
    }

    fn csr(hostname: &str) -> String {
        RcgenEngine::new().generate_request(hostname).unwrap().1
    }

    #[test]
    fn test_subject_is_certified_identity() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, AutosignConfig::AlwaysOn);

        let response = service
            .getcert(&csr("agent.example.com"), Some("other.example.com"), None)
            .unwrap();
        assert!(response.is_issued());
        assert!(service.ca().store().exists("agent.example.com"));
        assert!(!service.ca().store().exists("other.example.com"));

        let info = service.ca().inspect("agent.example.com").unwrap();
        assert_eq!(info.subject, "agent.example.com");
    }

    #[test]
    fn test_failed_save_keeps_host_unsigned() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, AutosignConfig::AlwaysOn);
        let store = service.ca().store();
        let signed_dir = store.root().join("signed");
        std::fs::remove_dir_all(&signed_dir).unwrap();
        std::fs::write(&signed_dir, "not a directory").unwrap();

        assert!(matches!(
            service.getcert(&csr("agent.example.com"), None, None),
            Err(CaError::Storage { .. })
        ));
        assert!(!store.exists("agent.example.com"));
        assert!(!store.private_key_path("agent.example.com").unwrap().exists());
        assert_eq!(store.inventory().unwrap(), "");
    }

    #[test]
    fn test_pending_files_request() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, AutosignConfig::Disabled);
        let text = csr("agent.example.com");

        let response = service
            .getcert(&text, None, Some("10.0.0.5".parse().unwrap()))
            .unwrap();
        assert!(!response.is_issued());
        assert_eq!(response.ca_certificate(), service.ca().ca_certificate());
        assert_eq!(
            service.ca().store().load_request("agent.example.com").unwrap(),
            Some(text)
        );
    }

    #[test]
    fn test_rejections_leave_no_trace() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, AutosignConfig::AlwaysOn);

        assert!(matches!(
            service.getcert("garbage", None, None),
            Err(CaError::MalformedRequest(_))
        ));
        assert!(matches!(
            service.getcert(&csr("bad name"), Some("agent.example.com"), None),
            Err(CaError::InvalidHostname(_))
        ));
        assert!(service.ca().list_requests().unwrap().is_empty());
        assert!(service.ca().store().list_signed().unwrap().is_empty());
    }

    #[test]
    fn test_server_certificate_on_open() {
        let dir = TempDir::new().unwrap();
        let settings = CaSettings {
            cadir: dir.path().join("ca"),
            server_name: Some("master.example.com".into()),
            ..CaSettings::default()
        };
        let service = CaService::open(&settings, Arc::new(RcgenEngine::new())).unwrap();
        assert!(service.ca().store().exists("master.example.com"));
    }
}
