//! Certificate issuance and cleaning.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use hostca_core::{
    validate_hostname, CaError, CertificateInfo, HostCertificateRecord, Result,
};

use crate::config::CaSettings;
use crate::engine::{CertificateEngine, IssueParams, SigningRequest};
use crate::identity::CaIdentity;
use crate::store::FileStore;

/// A freshly signed, not yet persisted, host certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCertificate {
    /// Subject and store key
    pub hostname: String,
    /// Host certificate (PEM)
    pub certificate: String,
    /// CA certificate (PEM)
    pub ca_certificate: String,
    /// Serial number
    pub serial: u64,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
}

/// The CA issuer: signs requests with the CA identity and maintains the
/// store's signed certificates.
pub struct CertificateAuthority {
    identity: Arc<CaIdentity>,
    engine: Arc<dyn CertificateEngine>,
    store: Arc<FileStore>,
    cert_ttl_days: u32,
}

impl CertificateAuthority {
    pub fn new(
        identity: Arc<CaIdentity>,
        engine: Arc<dyn CertificateEngine>,
        store: Arc<FileStore>,
        cert_ttl_days: u32,
    ) -> Self {
        Self {
            identity,
            engine,
            store,
            cert_ttl_days,
        }
    }

    /// Open the store in `settings.cadir` and load or create the CA there.
    pub fn open(settings: &CaSettings, engine: Arc<dyn CertificateEngine>) -> Result<Self> {
        settings.validate()?;
        let store = Arc::new(FileStore::open(&settings.cadir)?);
        let identity = CaIdentity::load_or_create(
            &store,
            engine.as_ref(),
            &settings.ca_name,
            settings.ca_ttl_days,
        )?;

        Ok(Self::new(
            Arc::new(identity),
            engine,
            store,
            settings.cert_ttl_days,
        ))
    }

    #[must_use]
    pub fn identity(&self) -> &CaIdentity {
        &self.identity
    }

    /// CA certificate (PEM)
    #[must_use]
    pub fn ca_certificate(&self) -> &str {
        self.identity.certificate_pem()
    }

    #[must_use]
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Parse a PEM request with the engine.
    pub fn parse_request(&self, csr_pem: &str) -> Result<SigningRequest> {
        self.engine.parse_request(csr_pem)
    }

    /// Sign `request` as `hostname`.
    ///
    /// Both the requested subject and `hostname` must be valid hostnames.
    /// Nothing is persisted except the serial counter; see
    /// [`CertificateAuthority::commit`].
    pub fn sign(&self, request: &SigningRequest, hostname: &str) -> Result<SignedCertificate> {
        validate_hostname(&request.subject)?;
        let hostname = validate_hostname(hostname)?;

        let serial = self.store.next_serial()?;
        let params = IssueParams::new(hostname, serial, self.cert_ttl_days)?;
        let certificate = self.engine.sign(request, &self.identity, &params)?;

        Ok(SignedCertificate {
            hostname: hostname.to_string(),
            certificate,
            ca_certificate: self.identity.certificate_pem().to_string(),
            serial,
            not_before: params.not_before,
            not_after: params.not_after,
        })
    }

    /// Persist a signed certificate: save it (and `private_key`, if the CA
    /// generated one), drop the pending request, record it in the
    /// inventory. The caller must hold the host lock.
    ///
    /// Only a failed save is an error, and it leaves the store as it was.
    /// Once the certificate is saved the host counts as signed, so a stale
    /// request or a missing inventory line is logged and ignored.
    pub fn commit(&self, signed: &SignedCertificate, private_key: Option<String>) -> Result<()> {
        let record = HostCertificateRecord {
            hostname: signed.hostname.clone(),
            csr: None,
            certificate: Some(signed.certificate.clone()),
            private_key,
        };
        self.store.save(&record)?;
        if let Err(e) = self.store.remove_request(&signed.hostname) {
            warn!(hostname = %signed.hostname, error = %e, "failed to remove pending request");
        }

        let line = format!(
            "0x{:04X} {} {} /CN={}",
            signed.serial,
            signed.not_before.format("%Y-%m-%dT%H:%M:%S%Z"),
            signed.not_after.format("%Y-%m-%dT%H:%M:%S%Z"),
            signed.hostname
        );
        if let Err(e) = self.store.append_inventory(&line) {
            warn!(hostname = %signed.hostname, error = %e, "failed to update inventory");
        }

        info!(hostname = %signed.hostname, serial = signed.serial, "issued certificate");
        Ok(())
    }

    /// Remove every certificate, request and key held for `hostname`.
    ///
    /// Cleaning an unknown host returns [`CaError::NotFound`].
    pub fn clean(&self, hostname: &str) -> Result<()> {
        let hostname = validate_hostname(hostname)?;
        let _guard = self.store.lock(hostname);
        self.store.delete(hostname)?;
        info!(hostname, "cleaned certificate material");
        Ok(())
    }

    /// Sign the request an agent filed earlier (operator action).
    pub fn sign_pending(&self, hostname: &str) -> Result<SignedCertificate> {
        let hostname = validate_hostname(hostname)?;
        let _guard = self.store.lock(hostname);

        if self.store.exists(hostname) {
            return Err(CaError::AlreadySigned {
                hostname: hostname.to_string(),
            });
        }
        let csr = self
            .store
            .load_request(hostname)?
            .ok_or_else(|| CaError::not_found(hostname))?;

        let request = self.engine.parse_request(&csr)?;
        let signed = self.sign(&request, hostname)?;
        self.commit(&signed, None)?;
        Ok(signed)
    }

    /// Issue a certificate for `hostname` with a key generated here; the
    /// CA keeps a copy of the key.
    pub fn generate(&self, hostname: &str) -> Result<SignedCertificate> {
        let hostname = validate_hostname(hostname)?;
        let _guard = self.store.lock(hostname);

        if self.store.exists(hostname) {
            return Err(CaError::AlreadySigned {
                hostname: hostname.to_string(),
            });
        }
        self.generate_unlocked(hostname)
    }

    /// The certificate for the master's own hostname, issued on first use
    /// regardless of the autosign policy.
    pub fn ensure_host_certificate(&self, hostname: &str) -> Result<String> {
        let hostname = validate_hostname(hostname)?;
        let _guard = self.store.lock(hostname);

        if let Some(certificate) = self.store.certificate(hostname)? {
            return Ok(certificate);
        }
        Ok(self.generate_unlocked(hostname)?.certificate)
    }

    fn generate_unlocked(&self, hostname: &str) -> Result<SignedCertificate> {
        let (private_key, csr) = self.engine.generate_request(hostname)?;
        let request = self.engine.parse_request(&csr)?;
        let signed = self.sign(&request, hostname)?;
        self.commit(&signed, Some(private_key))?;
        Ok(signed)
    }

    /// Hostnames waiting for an operator.
    pub fn list_requests(&self) -> Result<Vec<String>> {
        self.store.list_requests()
    }

    /// Summaries of every issued certificate. Unreadable ones are skipped.
    pub fn list_certificates(&self) -> Result<Vec<CertificateInfo>> {
        let mut infos = Vec::new();
        for hostname in self.store.list_signed()? {
            match self.inspect(&hostname) {
                Ok(info) => infos.push(info),
                Err(e) => warn!(hostname, error = %e, "skipping unreadable certificate"),
            }
        }
        Ok(infos)
    }

    /// Summary of the certificate issued to `hostname`.
    pub fn inspect(&self, hostname: &str) -> Result<CertificateInfo> {
        let certificate = self
            .store
            .certificate(hostname)?
            .ok_or_else(|| CaError::not_found(hostname))?;
        self.engine.inspect(&certificate)
    }
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("identity", &self.identity)
            .field("store", &self.store.root())
            .field("cert_ttl_days", &self.cert_ttl_days)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RcgenEngine;
    use tempfile::TempDir;

    fn authority(dir: &TempDir) -> CertificateAuthority {
        let settings = CaSettings {
            cadir: dir.path().join("ca"),
            ca_name: "Test CA".into(),
            ..CaSettings::default()
        };
        CertificateAuthority::open(&settings, Arc::new(RcgenEngine::new())).unwrap()
    }

    #[test]
    fn test_sign_does_not_persist() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);
        let (_, csr) = RcgenEngine::new().generate_request("a.example.com").unwrap();

        let request = ca.parse_request(&csr).unwrap();
        let signed = ca.sign(&request, "a.example.com").unwrap();

        assert!(signed.certificate.contains("BEGIN CERTIFICATE"));
        assert_eq!(signed.ca_certificate, ca.ca_certificate());
        assert!(!ca.store().exists("a.example.com"));
    }

    #[test]
    fn test_sign_rejects_bad_subject() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);
        let (_, csr) = RcgenEngine::new().generate_request("bad name").unwrap();

        let request = ca.parse_request(&csr).unwrap();
        assert!(matches!(
            ca.sign(&request, "a.example.com"),
            Err(CaError::InvalidHostname(_))
        ));
    }

    #[test]
    fn test_serials_follow_ca() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);

        let first = ca.generate("a.example.com").unwrap();
        let second = ca.generate("b.example.com").unwrap();
        // serial 1 belongs to the CA certificate
        assert_eq!(first.serial, 2);
        assert_eq!(second.serial, 3);

        let inventory = ca.store().inventory().unwrap();
        assert!(inventory.contains("0x0002"));
        assert!(inventory.contains("/CN=b.example.com"));
    }

    #[test]
    fn test_generate_keeps_key() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);

        ca.generate("a.example.com").unwrap();
        let record = ca.store().load("a.example.com").unwrap();
        assert!(record.is_issued());
        assert!(record.private_key.unwrap().contains("PRIVATE KEY"));

        assert!(matches!(
            ca.generate("a.example.com"),
            Err(CaError::AlreadySigned { .. })
        ));
    }

    #[test]
    fn test_ensure_host_certificate_is_stable() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);

        let first = ca.ensure_host_certificate("master.example.com").unwrap();
        let second = ca.ensure_host_certificate("master.example.com").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_list_and_inspect() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);

        ca.generate("b.example.com").unwrap();
        ca.generate("a.example.com").unwrap();
        ca.store().save_request("c.example.com", "CSR").unwrap();

        let infos = ca.list_certificates().unwrap();
        let subjects: Vec<_> = infos.iter().map(|i| i.subject.as_str()).collect();
        assert_eq!(subjects, vec!["a.example.com", "b.example.com"]);
        assert!(infos.iter().all(|i| i.issuer == "Test CA"));

        assert_eq!(ca.list_requests().unwrap(), vec!["c.example.com"]);
        assert!(ca.inspect("c.example.com").unwrap_err().is_not_found());
    }

    #[test]
    fn test_failed_generate_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);
        let signed_dir = ca.store().root().join("signed");
        std::fs::remove_dir_all(&signed_dir).unwrap();
        std::fs::write(&signed_dir, "not a directory").unwrap();

        assert!(matches!(
            ca.generate("a.example.com"),
            Err(CaError::Storage { .. })
        ));
        assert!(!ca.store().exists("a.example.com"));
        assert!(!ca.store().private_key_path("a.example.com").unwrap().exists());
        assert!(!ca.store().inventory().unwrap().contains("a.example.com"));
    }

    #[test]
    fn test_stale_request_does_not_fail_commit() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);
        ca.store().save_request("a.example.com", "CSR").unwrap();

        // a request path that cannot be removed as a file
        let request_path = ca.store().root().join("requests").join("a.example.com.pem");
        std::fs::remove_file(&request_path).unwrap();
        std::fs::create_dir(&request_path).unwrap();
        std::fs::write(request_path.join("keep"), "x").unwrap();

        ca.generate("a.example.com").unwrap();
        assert!(ca.store().exists("a.example.com"));
        assert!(ca.store().inventory().unwrap().contains("/CN=a.example.com"));
    }

    #[test]
    fn test_clean_unknown_host() {
        let dir = TempDir::new().unwrap();
        let ca = authority(&dir);
        assert!(ca.clean("ghost.example.com").unwrap_err().is_not_found());
    }
}
