//! Command implementations.

pub mod autosign;
pub mod clean;
pub mod config;
pub mod generate;
pub mod getcert;
pub mod inspect;
pub mod list;
pub mod sign;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use hostca::{CaService, CaSettings, RcgenEngine};

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Settings file in use
    pub config_path: PathBuf,

    /// Loaded settings, with command-line overrides applied
    pub settings: CaSettings,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl Context {
    /// Open the CA and run `op` against it on the blocking pool.
    ///
    /// Key generation and signing are CPU-bound and the store does
    /// synchronous file I/O, so neither runs on the async executor.
    pub async fn with_service<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&CaService) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || {
            let service = CaService::open(&settings, Arc::new(RcgenEngine::new()))?;
            op(&service)
        })
        .await?
    }
}
