//! Cog configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Where validation results go besides the returned outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CogConfig {
    /// CSV file that every validation result is appended to
    pub result_log: Option<PathBuf>,

    /// Where the normalized YAML of a valid scenario is written
    pub crank_output: Option<PathBuf>,
}

impl CogConfig {
    /// Parse a config from a YAML string. An empty document yields defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Overlay values given explicitly (flags, environment) on top of the
    /// loaded ones.
    pub fn merge(mut self, result_log: Option<PathBuf>, crank_output: Option<PathBuf>) -> Self {
        if result_log.is_some() {
            self.result_log = result_log;
        }
        if crank_output.is_some() {
            self.crank_output = crank_output;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CogConfig::from_yaml("").unwrap();
        assert_eq!(config, CogConfig::default());
        assert!(config.result_log.is_none());
    }

    #[test]
    fn test_parse_paths() {
        let config = CogConfig::from_yaml("result_log: out/results.csv\n").unwrap();
        assert_eq!(config.result_log, Some(PathBuf::from("out/results.csv")));
        assert!(config.crank_output.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            CogConfig::from_yaml("log: x\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_merge_prefers_explicit_values() {
        let config = CogConfig::from_yaml("result_log: a.csv\ncrank_output: a.crank.yml\n")
            .unwrap()
            .merge(Some(PathBuf::from("b.csv")), None);
        assert_eq!(config.result_log, Some(PathBuf::from("b.csv")));
        assert_eq!(config.crank_output, Some(PathBuf::from("a.crank.yml")));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            CogConfig::from_yaml_file(dir.path().join("nope.yml")),
            Err(ConfigError::Io(_))
        ));
    }
}
