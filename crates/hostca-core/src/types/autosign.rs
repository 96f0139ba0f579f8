use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;

/// The `autosign` setting.
///
/// Serialized as it is written in a settings file: `false`, `true`, or a
/// string holding the path of a rule file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AutosignRepr", into = "AutosignRepr")]
pub enum AutosignConfig {
    /// Never autosign
    #[default]
    Disabled,
    /// Autosign every request; any rule file is ignored
    AlwaysOn,
    /// Autosign hosts matching a line of this file
    RuleFile(PathBuf),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AutosignRepr {
    Flag(bool),
    Path(String),
}

impl From<AutosignRepr> for AutosignConfig {
    fn from(repr: AutosignRepr) -> Self {
        match repr {
            AutosignRepr::Flag(true) => Self::AlwaysOn,
            AutosignRepr::Flag(false) => Self::Disabled,
            AutosignRepr::Path(s) => match s.parse() {
                Ok(config) => config,
                Err(never) => match never {},
            },
        }
    }
}

impl From<AutosignConfig> for AutosignRepr {
    fn from(config: AutosignConfig) -> Self {
        match config {
            AutosignConfig::Disabled => Self::Flag(false),
            AutosignConfig::AlwaysOn => Self::Flag(true),
            AutosignConfig::RuleFile(path) => Self::Path(path.to_string_lossy().into_owned()),
        }
    }
}

impl FromStr for AutosignConfig {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.to_ascii_lowercase().as_str() {
            "true" => Self::AlwaysOn,
            "false" | "" => Self::Disabled,
            _ => Self::RuleFile(PathBuf::from(s)),
        })
    }
}

impl std::fmt::Display for AutosignConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "false"),
            Self::AlwaysOn => write!(f, "true"),
            Self::RuleFile(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One line of an autosign rule file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AutosignRule {
    /// Matches only this exact hostname
    Exact(String),
    /// Matches any hostname ending with this suffix. The stored suffix
    /// keeps its leading dot, so `*.other.com` is stored as `.other.com`.
    Suffix(String),
}

impl AutosignRule {
    /// Parse one line. Blank lines and `#` comments yield `None`.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        match line.strip_prefix("*.") {
            Some("") => None,
            Some(domain) => Some(Self::Suffix(format!(".{domain}"))),
            None => Some(Self::Exact(line.to_string())),
        }
    }

    /// Parse every rule in the contents of a rule file
    #[must_use]
    pub fn parse_all(content: &str) -> Vec<Self> {
        content.lines().filter_map(Self::parse).collect()
    }

    /// Does this rule allow `hostname`?
    #[must_use]
    pub fn matches(&self, hostname: &str) -> bool {
        match self {
            Self::Exact(name) => name == hostname,
            Self::Suffix(suffix) => hostname.len() > suffix.len() && hostname.ends_with(suffix),
        }
    }
}

impl std::fmt::Display for AutosignRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(name) => write!(f, "{name}"),
            Self::Suffix(suffix) => write!(f, "*{suffix}"),
        }
    }
}
