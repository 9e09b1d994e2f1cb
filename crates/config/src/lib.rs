//! Rule persistence for keyflow.
//!
//! Rules live in one JSON document under the per-user config directory.
//! Loading degrades to an empty rule set when the file is missing or
//! unreadable - the daemon then seeds defaults - while saving and
//! importing surface their errors to the caller.

mod seed;
mod watcher;

pub use seed::seed_rules;
pub use watcher::{ReloadCallback, RuleFileWatcher};

use chrono::{DateTime, Utc};
use keyflow_rules::Rule;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Version stamp written into every rule file.
pub const RULE_FILE_VERSION: &str = "1.0.0";

/// Errors surfaced by explicit persistence operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no user config directory available")]
    NoConfigDir,

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The on-disk rule document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleFile {
    pub rules: Vec<Rule>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

/// `<user config dir>/keyflow/rules.json`.
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("keyflow").join("rules.json"))
}

/// Load rules from the given path.
///
/// A missing, unreadable or corrupt file is an empty rule set, not an
/// error; the condition is logged and the daemon keeps running.
pub fn load_rules(path: &Path) -> Vec<Rule> {
    if !path.exists() {
        return Vec::new();
    }

    match read_rule_file(path) {
        Ok(file) => file.rules,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not load rule file, starting empty");
            Vec::new()
        }
    }
}

/// Write the rules to the given path, creating parent directories on
/// demand.
pub fn save_rules(path: &Path, rules: &[Rule]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = RuleFile {
        rules: rules.to_vec(),
        last_updated: Utc::now(),
        version: RULE_FILE_VERSION.to_string(),
    };

    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Export rules to an arbitrary path, same encoding as [`save_rules`].
pub fn export_rules(path: &Path, rules: &[Rule]) -> Result<()> {
    save_rules(path, rules)
}

/// Import rules from an arbitrary path.
///
/// Unlike [`load_rules`] this is a user-initiated action, so problems are
/// surfaced instead of swallowed.
pub fn import_rules(path: &Path) -> Result<Vec<Rule>> {
    Ok(read_rule_file(path)?.rules)
}

fn read_rule_file(path: &Path) -> Result<RuleFile> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyflow_rules::RuleKind;

    #[test]
    fn test_save_then_load_round_trips_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let mut rule = Rule::new(
            "Zhihu",
            RuleKind::Website,
            "*.zhihu.com",
            "Chinese (Simplified)",
        )
        .with_priority(4);
        rule.last_used = Some(Utc::now());
        rule.usage_count = 12;

        save_rules(&path, &[rule.clone()]).unwrap();
        let loaded = load_rules(&path);

        assert_eq!(loaded, vec![rule]);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("rules.json");

        save_rules(&path, &[]).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_rules(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(load_rules(&path).is_empty());
    }

    #[test]
    fn test_import_surfaces_errors() {
        let dir = tempfile::tempdir().unwrap();

        assert!(import_rules(&dir.path().join("nope.json")).is_err());

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "[]").unwrap();
        assert!(import_rules(&corrupt).is_err());
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let rules = seed_rules();

        export_rules(&path, &rules).unwrap();
        let imported = import_rules(&path).unwrap();

        assert_eq!(imported, rules);
    }

    #[test]
    fn test_rule_file_stamps_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        save_rules(&path, &[]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["version"], RULE_FILE_VERSION);
        assert!(json.get("lastUpdated").is_some());
    }
}
