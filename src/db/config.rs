//! Database configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::executor::ExecutorOptions;

/// Database configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Base directory holding the `schemas/` and `records/` trees.
    pub path: PathBuf,
    /// Create the directory tree if it doesn't exist.
    pub create_if_missing: bool,
    /// Check update values against their column rules.
    pub validate_updates: bool,
    /// Page size for queries that give no limit.
    pub default_limit: usize,
    /// fsync temp files before renaming them into place.
    pub sync_writes: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            create_if_missing: true,
            validate_updates: true,
            default_limit: 100,
            sync_writes: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set create_if_missing flag.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Set validate_updates flag.
    pub fn validate_updates(mut self, value: bool) -> Self {
        self.validate_updates = value;
        self
    }

    /// Set the default query page size.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set sync_writes flag.
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    pub(crate) fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            validate_updates: self.validate_updates,
            default_limit: self.default_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::new("/tmp/records");
        assert_eq!(config.path, PathBuf::from("/tmp/records"));
        assert!(config.create_if_missing);
        assert!(config.validate_updates);
        assert_eq!(config.default_limit, 100);
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::new("db")
            .create_if_missing(false)
            .validate_updates(false)
            .default_limit(25)
            .sync_writes(false);
        let options = config.executor_options();
        assert!(!options.validate_updates);
        assert_eq!(options.default_limit, 25);
        assert!(!config.sync_writes);
    }

    #[test]
    fn test_partial_json() {
        let config: DatabaseConfig =
            serde_json::from_value(json!({"path": "/srv/tables", "default_limit": 50})).unwrap();
        assert_eq!(config.path, PathBuf::from("/srv/tables"));
        assert_eq!(config.default_limit, 50);
        assert!(config.sync_writes);
    }
}
