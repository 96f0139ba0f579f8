//! Locating and loading the settings file.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use hostca::CaSettings;

/// Default settings file path.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "hostca")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// The settings file in use: `explicit` if given, else the default.
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit.map_or_else(default_path, Ok)
}

/// Load settings from `path`, applying a `cadir` override.
pub fn load(path: &Path, cadir: Option<PathBuf>) -> Result<CaSettings> {
    let mut settings = CaSettings::load(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    if let Some(cadir) = cadir {
        settings.cadir = cadir;
    }
    Ok(settings)
}

/// Apply `key = value` to `settings`.
pub fn set_value(settings: &mut CaSettings, key: &str, value: &str) -> Result<()> {
    match key {
        "cadir" => settings.cadir = PathBuf::from(value),
        "ca_name" => settings.ca_name = value.to_string(),
        "autosign" => settings.autosign = value.parse()?,
        "ca_ttl_days" => settings.ca_ttl_days = value.parse()?,
        "cert_ttl_days" => settings.cert_ttl_days = value.parse()?,
        "server_name" => {
            settings.server_name = (!value.is_empty()).then(|| value.to_string());
        }
        _ => {
            anyhow::bail!(
                "Unknown config key: {key}\n\n\
                 Available keys:\n  \
                 cadir          - CA directory\n  \
                 ca_name        - Common name of a newly generated CA\n  \
                 autosign       - true, false, or the path of a rule file\n  \
                 ca_ttl_days    - CA certificate validity (days)\n  \
                 cert_ttl_days  - Host certificate validity (days)\n  \
                 server_name    - Hostname of the master (\"\" to unset)"
            );
        }
    }
    settings.validate()?;
    Ok(())
}
