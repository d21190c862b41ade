//! Import configuration
//!
//! Loaded from a JSON file and validated on load:
//!
//! ```json
//! {
//!   "catalog_dir": "./data",
//!   "legacy_dialect_threshold": "3.2",
//!   "disallow_major_schema_upgrade": false,
//!   "log_filter": "schemamap=info"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use super::errors::{ImportError, ImportResult};
use super::options::ImportOptions;
use crate::graph::DialectVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Root directory of the file catalog
    pub catalog_dir: String,

    /// First dialect with named enumerators. Crossing it is the only
    /// revision in which enumerators may be renamed.
    #[serde(default)]
    pub legacy_dialect_threshold: DialectVersion,

    #[serde(default)]
    pub disallow_major_schema_upgrade: bool,

    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "schemamap=info".to_string()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            catalog_dir: ".".to_string(),
            legacy_dialect_threshold: DialectVersion::default(),
            disallow_major_schema_upgrade: false,
            log_filter: default_log_filter(),
        }
    }
}

impl ImportConfig {
    pub fn load(path: &Path) -> ImportResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ImportError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: ImportConfig = serde_json::from_str(&content)
            .map_err(|e| ImportError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.catalog_dir.trim().is_empty() {
            return Err(ImportError::Config("catalog_dir must not be empty".into()));
        }
        if self.legacy_dialect_threshold.major == 0 {
            return Err(ImportError::Config(format!(
                "legacy_dialect_threshold {} is not a dialect version",
                self.legacy_dialect_threshold
            )));
        }
        EnvFilter::try_new(&self.log_filter).map_err(|e| {
            ImportError::Config(format!("invalid log_filter '{}': {}", self.log_filter, e))
        })?;
        Ok(())
    }

    pub fn catalog_path(&self) -> &Path {
        Path::new(&self.catalog_dir)
    }

    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            disallow_major_schema_upgrade: self.disallow_major_schema_upgrade,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("schemamap.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults_apply() {
        let dir = TempDir::new().unwrap();
        let config = ImportConfig::load(&write(&dir, r#"{ "catalog_dir": "./data" }"#)).unwrap();
        assert_eq!(config.legacy_dialect_threshold, DialectVersion::new(3, 2));
        assert!(!config.options().disallow_major_schema_upgrade);
        assert_eq!(config.log_filter, "schemamap=info");
    }

    #[test]
    fn test_threshold_and_policy_read() {
        let dir = TempDir::new().unwrap();
        let config = ImportConfig::load(&write(
            &dir,
            r#"{ "catalog_dir": "d", "legacy_dialect_threshold": "3.1",
                 "disallow_major_schema_upgrade": true }"#,
        ))
        .unwrap();
        assert_eq!(config.legacy_dialect_threshold, DialectVersion::new(3, 1));
        assert!(config.options().disallow_major_schema_upgrade);
    }

    #[test]
    fn test_empty_catalog_dir_rejected() {
        let dir = TempDir::new().unwrap();
        let err = ImportConfig::load(&write(&dir, r#"{ "catalog_dir": " " }"#)).unwrap_err();
        assert_eq!(err.code(), "SCHEMAMAP_CONFIG");
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let dir = TempDir::new().unwrap();
        let err = ImportConfig::load(&write(
            &dir,
            r#"{ "catalog_dir": "d", "legacy_dialect_threshold": "three" }"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ImportConfig::load(Path::new("/nonexistent/schemamap.json")).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }
}
