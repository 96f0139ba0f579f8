//! Core types for the hostca certificate authority.
//!
//! This crate provides the foundational types shared across hostca:
//!
//! - **Types**: autosign configuration and rules, per-host certificate
//!   records, the tagged [`CertResponse`] returned by `getcert`, and parsed
//!   [`CertificateInfo`] summaries
//! - **Errors**: the [`CaError`] taxonomy that lets callers tell a pending
//!   request apart from a rejected one
//!
//! # Example
//!
//! ```rust
//! use hostca_core::{AutosignConfig, AutosignRule};
//!
//! let config: AutosignConfig = "true".parse().unwrap();
//! assert_eq!(config, AutosignConfig::AlwaysOn);
//!
//! let rule = AutosignRule::parse("*.other.com").unwrap();
//! assert!(rule.matches("fakehost.other.com"));
//! ```

mod error;
pub mod types;

pub use error::{CaError, Result};
pub use types::*;
