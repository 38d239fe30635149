//! Identity of the machine and account running the export.
//!
//! Shown in the report banner and in `tag_not_found.log` lines.

const UNKNOWN: &str = "unknown";

/// Host name and user name of the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub host: String,
    pub user: String,
}

impl HostInfo {
    /// Reads host and user from the environment.
    ///
    /// Host: `HOSTNAME`, `COMPUTERNAME`, then `/etc/hostname`.
    /// User: `USER`, `USERNAME`, then `LOGNAME`. Falls back to `unknown`.
    #[must_use]
    pub fn gather() -> Self {
        let host = first_env(&["HOSTNAME", "COMPUTERNAME"])
            .or_else(|| {
                std::fs::read_to_string("/etc/hostname")
                    .ok()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| UNKNOWN.to_string());
        let user =
            first_env(&["USER", "USERNAME", "LOGNAME"]).unwrap_or_else(|| UNKNOWN.to_string());
        Self { host, user }
    }

    /// Fixed identity, for tests and reproducible output.
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
        }
    }
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_never_yields_empty_fields() {
        let info = HostInfo::gather();
        assert!(!info.host.is_empty());
        assert!(!info.user.is_empty());
    }

    #[test]
    fn test_new_keeps_values() {
        let info = HostInfo::new("srv01", "alice");
        assert_eq!(info.host, "srv01");
        assert_eq!(info.user, "alice");
    }
}
