use crate::{CaError, Result};

/// Longest hostname accepted as a certificate subject
pub const MAX_HOSTNAME_LEN: usize = 255;

/// Check that `hostname` is usable both as a certificate subject and as a
/// file name in the certificate store.
///
/// Accepts ASCII letters, digits, `-`, `_` and `.`; rejects empty names,
/// names starting with `.` and names containing `..`. No case folding is
/// applied.
pub fn validate_hostname(hostname: &str) -> Result<&str> {
    let valid = !hostname.is_empty()
        && hostname.len() <= MAX_HOSTNAME_LEN
        && !hostname.starts_with('.')
        && !hostname.contains("..")
        && hostname
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));

    if valid {
        Ok(hostname)
    } else {
        Err(CaError::InvalidHostname(hostname.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_hostnames() {
        for host in ["test.domain.com", "node-1", "web_01.example.org", "localhost"] {
            assert_eq!(validate_hostname(host).unwrap(), host);
        }
    }

    #[test]
    fn test_invalid_hostnames() {
        let too_long = "a".repeat(MAX_HOSTNAME_LEN + 1);
        for host in [
            "",
            ".hidden",
            "../etc/passwd",
            "a..b",
            "a/b",
            "with space",
            "*.other.com",
            too_long.as_str(),
        ] {
            assert!(
                matches!(validate_hostname(host), Err(CaError::InvalidHostname(_))),
                "{host:?} should be rejected"
            );
        }
    }
}
