//! Configuration parsing and management.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use writmacs_types::Target;

/// Directory under the platform config dir holding user assets
pub const APP_DIR: &str = "writmacs";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the writmacs.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root holding `keymaps/` and `snippets/`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub default_target: Target,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Raise on unknown macros and snippets instead of passing them through
    #[serde(default)]
    pub strict: bool,

    /// Seed for `studly` and `zalgo`
    #[serde(default)]
    pub seed: Option<u64>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_max_depth() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_target: Target::default(),
            max_depth: default_max_depth(),
            strict: false,
            seed: None,
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Get the data directory, resolved relative to the config file
    ///
    /// Falls back to the platform config dir; `None` when no home
    /// directory can be found.
    pub fn data_dir(&self) -> Option<PathBuf> {
        match &self.data_dir {
            Some(dir) => Some(self.resolve_path(dir)),
            None => BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR)),
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.default_target, Target::Md);
        assert_eq!(config.max_depth, 256);
        assert!(!config.strict);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_parse_fields() {
        let config = Config::from_yaml(
            "default_target: html\nmax_depth: 8\nstrict: true\nseed: 42\ndata_dir: /srv/writmacs\n",
        )
        .unwrap();
        assert_eq!(config.default_target, Target::Html);
        assert_eq!(config.max_depth, 8);
        assert!(config.strict);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.data_dir(), Some(PathBuf::from("/srv/writmacs")));
    }

    #[test]
    fn test_bad_target_is_a_parse_error() {
        let err = Config::from_yaml("default_target: pdf\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_relative_data_dir_follows_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("writmacs.yml");
        fs::write(&path, "data_dir: assets\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_dir(), Some(dir.path().join("assets")));
    }
}
