//! Autosign policy evaluation.
//!
//! The policy is re-read on every decision: the setting through an
//! [`AutosignSetting`] handle, the rule file from disk. Edits to either take
//! effect on the very next request without a restart.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use hostca_core::{AutosignConfig, AutosignRule};

/// Decide whether `hostname` may be signed without an operator.
///
/// `true` and `false` short-circuit; the rule file is only opened for
/// [`AutosignConfig::RuleFile`]. A missing, unreadable or half-written file
/// is treated as "no match".
pub fn autosign(config: &AutosignConfig, hostname: &str) -> bool {
    match config {
        AutosignConfig::Disabled => false,
        AutosignConfig::AlwaysOn => true,
        AutosignConfig::RuleFile(path) => read_rules(path).iter().any(|rule| {
            let matched = rule.matches(hostname);
            if matched {
                debug!(hostname, rule = %rule, "autosign rule matched");
            }
            matched
        }),
    }
}

/// Read the rules in `path`, returning none if it cannot be read.
pub fn read_rules(path: &Path) -> Vec<AutosignRule> {
    match std::fs::read_to_string(path) {
        Ok(content) => AutosignRule::parse_all(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "autosign file not found");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read autosign file");
            Vec::new()
        }
    }
}

/// Shared, mutable handle to the `autosign` setting.
///
/// Clones share the same value. Nothing is cached: each call to
/// [`AutosignSetting::autosign`] looks at the value current at that moment.
#[derive(Debug, Clone, Default)]
pub struct AutosignSetting {
    inner: Arc<RwLock<AutosignConfig>>,
}

impl AutosignSetting {
    #[must_use]
    pub fn new(config: AutosignConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> AutosignConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the value; the next decision sees it
    pub fn set(&self, config: AutosignConfig) {
        debug!(autosign = %config, "autosign setting changed");
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Evaluate the current policy for `hostname`
    #[must_use]
    pub fn autosign(&self, hostname: &str) -> bool {
        autosign(&self.get(), hostname)
    }
}
