//! # hostca-cli
//!
//! Operator interface to a hostca certificate authority.
//!
//! ## Features
//!
//! - **Agent requests**: submit a CSR the way an agent would (`getcert`)
//! - **Operator signing**: list and sign pending requests, clean hosts
//! - **Local issuance**: generate key and certificate for a host
//! - **Policy checks**: evaluate the autosign setting for hostnames
//! - **Multiple output formats**: pretty tables, JSON, YAML

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
