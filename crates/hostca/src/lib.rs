//! # hostca
//!
//! Host identity certificate authority for a configuration-management master.
//!
//! ## Architecture
//!
//! ```text
//! agent CSR ──► CaService::getcert
//!                  │  parse (CertificateEngine)
//!                  │  lock hostname (FileStore)
//!                  ├── already signed? ──► stored certificate, verbatim
//!                  ├── autosign? no ─────► request filed, Pending
//!                  └── autosign? yes ────► CertificateAuthority::sign
//!                                            └► FileStore::save ──► Issued
//! ```
//!
//! ## Security Model
//!
//! - The autosign policy is read at decision time, never cached
//! - A signed certificate is write-once; re-issuing requires a clean
//! - One signing operation per host, even under concurrent requests
//! - CA key and locally generated host keys are written with mode 0600
//!
//! ## Example
//!
//! ```rust,ignore
//! use hostca::{CaService, CaSettings, RcgenEngine};
//! use std::sync::Arc;
//!
//! let settings = CaSettings::load(path)?;
//! let service = CaService::open(&settings, Arc::new(RcgenEngine::new()))?;
//!
//! match service.getcert(&csr_pem, None, None)? {
//!     CertResponse::Issued { certificate, .. } => install(certificate),
//!     CertResponse::Pending { .. } => println!("waiting for an operator"),
//! }
//! ```

pub mod autosign;
pub mod config;
pub mod engine;
mod identity;
mod issuer;
mod locks;
mod service;
pub mod store;

pub use autosign::AutosignSetting;
pub use config::CaSettings;
pub use engine::{CertificateEngine, IssueParams, RcgenEngine, SigningRequest};
pub use identity::CaIdentity;
pub use issuer::{CertificateAuthority, SignedCertificate};
pub use locks::{HostGuard, HostLocks};
pub use service::CaService;
pub use store::FileStore;

pub use hostca_core::{
    validate_hostname, AutosignConfig, AutosignRule, CaError, CertResponse, CertificateInfo,
    HostCertificateRecord, Result,
};
