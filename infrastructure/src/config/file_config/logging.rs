//! Log destinations from TOML (`[logging]` section)
//!
//! ```toml
//! [logging]
//! audit_file = "~/.local/share/council-engine/audit.jsonl"
//! file = "/var/log/council/council.log"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL audit log; audit events are dropped when unset
    pub audit_file: Option<String>,
    /// Daily-rotated diagnostic log, in addition to stderr
    pub file: Option<String>,
}

impl FileLoggingConfig {
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.audit_file.as_deref().map(expand_home)
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.file.as_deref().map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default_is_off() {
        let config = FileLoggingConfig::default();
        assert!(config.audit_path().is_none());
        assert!(config.file_path().is_none());
    }

    #[test]
    fn test_absolute_path_is_kept() {
        let config = FileLoggingConfig {
            audit_file: Some("/tmp/audit.jsonl".to_string()),
            file: None,
        };
        assert_eq!(config.audit_path(), Some(PathBuf::from("/tmp/audit.jsonl")));
    }

    #[test]
    fn test_home_is_expanded() {
        let config = FileLoggingConfig {
            audit_file: None,
            file: Some("~/council.log".to_string()),
        };
        let path = config.file_path().unwrap();
        if dirs::home_dir().is_some() {
            assert!(!path.starts_with("~"));
            assert!(path.ends_with("council.log"));
        }
    }
}
