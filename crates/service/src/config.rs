//! Project service configuration
//!
//! Loaded from TOML, e.g.:
//!
//! ```toml
//! allow_default_project = ["scratch.ts", "*.config.js"]
//! default_project = "tsconfig.base.json"
//! maximum_open_files = 16
//! maximum_default_project_file_match_count = 8
//! incremental_sync = true
//! orphan_policy = "open"
//! ```

use crate::classify::DefaultProjectAllowlist;
use crate::error::{default_project_explanation, Result, ServiceError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one [`crate::ProjectSession`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Globs of files allowed to fall back to the default project
    #[serde(default)]
    pub allow_default_project: Vec<String>,

    /// Project descriptor supplying the default project's options
    #[serde(default)]
    pub default_project: Option<PathBuf>,

    /// Files kept open in the backend at once (default: 16)
    #[serde(default = "default_maximum_open_files")]
    pub maximum_open_files: usize,

    /// Files allowed to use the default project per run (default: 8)
    #[serde(default = "default_maximum_default_project_file_match_count")]
    pub maximum_default_project_file_match_count: usize,

    /// Send changes as character diffs instead of full replacements
    #[serde(default)]
    pub incremental_sync: bool,

    /// Extra file extensions the backend should recognize
    #[serde(default)]
    pub extra_file_extensions: Vec<String>,

    /// What to do with files no project or watch covers
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

/// Handling of orphaned files
///
/// An orphaned file is in no configured project when first seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Open it and let classification decide
    #[default]
    Open,
    /// Fail unless a registered watch covers it or it is allow-listed
    Reject,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            allow_default_project: Vec::new(),
            default_project: None,
            maximum_open_files: default_maximum_open_files(),
            maximum_default_project_file_match_count:
                default_maximum_default_project_file_match_count(),
            incremental_sync: false,
            extra_file_extensions: Vec::new(),
            orphan_policy: OrphanPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ServiceError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges and allow-list breadth
    pub fn validate(&self) -> Result<()> {
        if self.maximum_open_files == 0 {
            return Err(ServiceError::InvalidConfig(
                "maximum_open_files must be at least 1".to_string(),
            ));
        }

        if self.maximum_default_project_file_match_count == 0 {
            return Err(ServiceError::InvalidConfig(
                "maximum_default_project_file_match_count must be at least 1".to_string(),
            ));
        }

        for pattern in &self.allow_default_project {
            if pattern == "*" {
                return Err(ServiceError::InvalidConfig(format!(
                    "allow_default_project contains the overly wide '*'.{}",
                    default_project_explanation()
                )));
            }
            if pattern.contains("**") {
                return Err(ServiceError::InvalidConfig(format!(
                    "allow_default_project glob '{}' contains a disallowed '**'.{}",
                    pattern,
                    default_project_explanation()
                )));
            }
        }

        DefaultProjectAllowlist::new(&self.allow_default_project)?;
        Ok(())
    }
}

fn default_maximum_open_files() -> usize {
    16
}

fn default_maximum_default_project_file_match_count() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.maximum_open_files, 16);
        assert_eq!(config.maximum_default_project_file_match_count, 8);
        assert!(!config.incremental_sync);
        assert_eq!(config.orphan_policy, OrphanPolicy::Open);
    }

    #[test]
    fn test_full_document() {
        let config = ServiceConfig::from_toml_str(
            r#"
            allow_default_project = ["scratch.ts", "*.config.js"]
            default_project = "tsconfig.base.json"
            maximum_open_files = 4
            maximum_default_project_file_match_count = 2
            incremental_sync = true
            extra_file_extensions = [".vue"]
            orphan_policy = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.allow_default_project, vec!["scratch.ts", "*.config.js"]);
        assert_eq!(config.default_project, Some(PathBuf::from("tsconfig.base.json")));
        assert_eq!(config.maximum_open_files, 4);
        assert_eq!(config.maximum_default_project_file_match_count, 2);
        assert!(config.incremental_sync);
        assert_eq!(config.extra_file_extensions, vec![".vue"]);
        assert_eq!(config.orphan_policy, OrphanPolicy::Reject);
    }

    #[test]
    fn test_rejects_overly_wide_globs() {
        let err = ServiceConfig::from_toml_str(r#"allow_default_project = ["*"]"#).unwrap_err();
        assert!(err.to_string().contains("overly wide '*'"));

        let err = ServiceConfig::from_toml_str(r#"allow_default_project = ["src/**/*.ts"]"#)
            .unwrap_err();
        assert!(err.to_string().contains("disallowed '**'"));
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(matches!(
            ServiceConfig::from_toml_str("maximum_open_files = 0"),
            Err(ServiceError::InvalidConfig(_))
        ));
        assert!(matches!(
            ServiceConfig::from_toml_str("maximum_default_project_file_match_count = 0"),
            Err(ServiceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_types() {
        assert!(matches!(
            ServiceConfig::from_toml_str("incremental_sync = \"yes\""),
            Err(ServiceError::ParseConfig(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("projsync.toml");
        fs::write(&path, "maximum_open_files = 3\nincremental_sync = true\n").unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.maximum_open_files, 3);
        assert!(config.incremental_sync);

        let missing = temp_dir.path().join("missing.toml");
        assert!(matches!(
            ServiceConfig::load(&missing),
            Err(ServiceError::ReadConfig { .. })
        ));
    }
}
