//! CA settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use hostca_core::{AutosignConfig, CaError, Result};

use crate::store::{write_atomic, FileMode};

/// Longest accepted certificate lifetime (days).
pub const MAX_TTL_DAYS: u32 = 100 * 365;

/// Settings for a hostca certificate authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaSettings {
    /// Directory holding the CA key, certificate, serial and host material.
    #[serde(default = "default_cadir")]
    pub cadir: PathBuf,

    /// Common name of the CA certificate, used when generating it.
    #[serde(default = "default_ca_name")]
    pub ca_name: String,

    /// `false`, `true`, or the path of an autosign rule file.
    #[serde(default)]
    pub autosign: AutosignConfig,

    /// Validity of a newly generated CA certificate (days).
    #[serde(default = "default_ca_ttl_days")]
    pub ca_ttl_days: u32,

    /// Validity of issued host certificates (days).
    #[serde(default = "default_cert_ttl_days")]
    pub cert_ttl_days: u32,

    /// Hostname of the master itself. Its certificate is always signed,
    /// whatever the autosign policy says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
}

impl Default for CaSettings {
    fn default() -> Self {
        Self {
            cadir: default_cadir(),
            ca_name: default_ca_name(),
            autosign: AutosignConfig::default(),
            ca_ttl_days: default_ca_ttl_days(),
            cert_ttl_days: default_cert_ttl_days(),
            server_name: None,
        }
    }
}

impl CaSettings {
    /// Load settings from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| CaError::storage(path, e))?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| CaError::Config(format!("{}: {e}", path.display())))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as TOML, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CaError::storage(parent, e))?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| CaError::Config(e.to_string()))?;
        write_atomic(path, &content, FileMode::Public)
    }

    /// Reject settings the CA cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ca_name.trim().is_empty() {
            return Err(CaError::Config("ca_name must not be empty".into()));
        }
        let ttls = [
            ("ca_ttl_days", self.ca_ttl_days),
            ("cert_ttl_days", self.cert_ttl_days),
        ];
        for (key, days) in ttls {
            if days == 0 || days > MAX_TTL_DAYS {
                return Err(CaError::Config(format!(
                    "{key} must be between 1 and {MAX_TTL_DAYS}, got {days}"
                )));
            }
        }
        if let Some(name) = &self.server_name {
            hostca_core::validate_hostname(name)
                .map_err(|_| CaError::Config(format!("server_name {name:?} is not a valid hostname")))?;
        }
        Ok(())
    }
}

// Default value functions for serde.
fn default_cadir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("/var/lib/hostca/ca"),
        |d| d.join("hostca").join("ca"),
    )
}

fn default_ca_name() -> String {
    String::from("hostca CA")
}

const fn default_ca_ttl_days() -> u32 {
    5 * 365
}

const fn default_cert_ttl_days() -> u32 {
    5 * 365
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = CaSettings::default();
        assert_eq!(settings.autosign, AutosignConfig::Disabled);
        assert_eq!(settings.ca_ttl_days, 1825);
        assert_eq!(settings.cert_ttl_days, 1825);
        assert!(settings.server_name.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let settings = CaSettings::load(Path::new("/nonexistent/hostca.toml")).unwrap();
        assert_eq!(settings, CaSettings::default());
    }

    #[test]
    fn test_load_autosign_variants() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostca.toml");

        std::fs::write(&path, "autosign = true\ncadir = \"/srv/ca\"\n").unwrap();
        let settings = CaSettings::load(&path).unwrap();
        assert_eq!(settings.autosign, AutosignConfig::AlwaysOn);
        assert_eq!(settings.cadir, PathBuf::from("/srv/ca"));

        std::fs::write(&path, "autosign = \"/etc/hostca/autosign.conf\"\n").unwrap();
        let settings = CaSettings::load(&path).unwrap();
        assert_eq!(
            settings.autosign,
            AutosignConfig::RuleFile("/etc/hostca/autosign.conf".into())
        );
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostca.toml");

        std::fs::write(&path, "cert_ttl_days = 0\n").unwrap();
        assert!(matches!(CaSettings::load(&path), Err(CaError::Config(_))));

        std::fs::write(&path, "autosign = [1, 2]\n").unwrap();
        assert!(matches!(CaSettings::load(&path), Err(CaError::Config(_))));

        std::fs::write(&path, "ca_ttl_days = 4294967295\n").unwrap();
        assert!(matches!(CaSettings::load(&path), Err(CaError::Config(_))));

        let settings = CaSettings {
            cert_ttl_days: MAX_TTL_DAYS + 1,
            ..CaSettings::default()
        };
        assert!(settings.validate().is_err());
        let settings = CaSettings {
            cert_ttl_days: MAX_TTL_DAYS,
            ..CaSettings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("hostca.toml");

        let settings = CaSettings {
            cadir: dir.path().join("ca"),
            autosign: AutosignConfig::RuleFile(dir.path().join("autosign.conf")),
            server_name: Some("master.example.com".into()),
            ..CaSettings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(CaSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_save_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostca.toml");
        std::fs::write(&path, "garbage that is not toml [[[").unwrap();

        let settings = CaSettings {
            ca_name: "Replaced CA".into(),
            ..CaSettings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(CaSettings::load(&path).unwrap().ca_name, "Replaced CA");
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("hostca.toml")]);
    }
}
