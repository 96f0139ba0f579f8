//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hostca::{
    AutosignConfig, CaError, CaIdentity, CaService, CaSettings, CertificateEngine,
    CertificateInfo, IssueParams, Result, SigningRequest,
};

/// Engine producing text "certificates", counting every signing operation.
///
/// Requests look like `FAKE CSR <host>`; certificates like
/// `FAKE CERT <host> <serial>`.
#[derive(Debug, Default)]
pub struct FakeEngine {
    signed: AtomicUsize,
    delay: Duration,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every signature take `delay`, widening race windows.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            signed: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn sign_count(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }
}

pub fn fake_csr(hostname: &str) -> String {
    format!("FAKE CSR {hostname}")
}

impl CertificateEngine for FakeEngine {
    fn parse_request(&self, csr_pem: &str) -> Result<SigningRequest> {
        let subject = csr_pem
            .strip_prefix("FAKE CSR ")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CaError::MalformedRequest("not a fake request".into()))?;
        Ok(SigningRequest {
            subject: subject.to_string(),
            pem: csr_pem.to_string(),
        })
    }

    fn sign(
        &self,
        _request: &SigningRequest,
        _ca: &CaIdentity,
        params: &IssueParams,
    ) -> Result<String> {
        std::thread::sleep(self.delay);
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(format!("FAKE CERT {} {}", params.common_name, params.serial))
    }

    fn generate_ca(&self, params: &IssueParams) -> Result<CaIdentity> {
        Ok(CaIdentity::new(
            params.common_name.clone(),
            format!("FAKE CA CERT {}", params.common_name),
            "FAKE CA KEY",
        ))
    }

    fn generate_request(&self, hostname: &str) -> Result<(String, String)> {
        Ok((format!("FAKE KEY {hostname}"), fake_csr(hostname)))
    }

    fn inspect(&self, certificate_pem: &str) -> Result<CertificateInfo> {
        let mut parts = certificate_pem
            .strip_prefix("FAKE CERT ")
            .ok_or_else(|| CaError::CertParse("not a fake certificate".into()))?
            .split(' ');
        let subject = parts.next().unwrap_or_default().to_string();
        let serial = parts.next().unwrap_or_default().to_string();
        let now = Utc::now();
        Ok(CertificateInfo {
            subject,
            issuer: "Fake CA".into(),
            serial,
            not_before: now,
            not_after: now,
            fingerprint: String::new(),
        })
    }
}

pub fn settings(cadir: &Path, autosign: AutosignConfig) -> CaSettings {
    CaSettings {
        cadir: cadir.to_path_buf(),
        autosign,
        ..CaSettings::default()
    }
}

/// A service over `engine` with its store in `cadir`.
pub fn fake_service(cadir: &Path, autosign: AutosignConfig, engine: Arc<FakeEngine>) -> CaService {
    CaService::open(&settings(cadir, autosign), engine).unwrap()
}
