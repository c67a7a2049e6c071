//! Configuration schema (driftlens.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Artifact locations for one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Path to the environment's manifest.json
    pub manifest: PathBuf,

    /// Path to the environment's catalog.json, if generated
    #[serde(default)]
    pub catalog: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base environment artifacts (e.g. production state)
    #[serde(default)]
    pub base: Option<EnvironmentConfig>,

    /// Current environment artifacts (e.g. the dev branch build)
    #[serde(default)]
    pub current: Option<EnvironmentConfig>,

    /// Poll interval for diagnostic runs, in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_poll_interval() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: None,
            current: None,
            poll_interval_secs: default_poll_interval(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Resolve relative artifact paths against the config file's directory
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse config TOML: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval_secs, 2);
        assert!(config.base.is_none());
        assert!(config.current.is_none());
    }

    #[test]
    fn parse_environments() {
        let config = Config::from_toml(
            r#"
            poll_interval_secs = 5

            [base]
            manifest = "state/manifest.json"
            catalog = "state/catalog.json"

            [current]
            manifest = "target/manifest.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval_secs, 5);
        let base = config.base.unwrap();
        assert_eq!(base.manifest, PathBuf::from("state/manifest.json"));
        assert!(base.catalog.is_some());
        assert!(config.current.unwrap().catalog.is_none());
    }

    #[test]
    fn resolve_relative_paths() {
        let mut config = Config::default();
        config.project_root = PathBuf::from("/project");

        assert_eq!(
            config.resolve(Path::new("target/manifest.json")),
            PathBuf::from("/project/target/manifest.json")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/manifest.json")),
            PathBuf::from("/abs/manifest.json")
        );
    }
}
