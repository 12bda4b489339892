//! Configuration for eventemitter

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Listener count per event at which a warning is raised (-1 = unlimited)
    #[serde(default = "default_max_listeners")]
    pub max_listeners: i64,

    /// Buffered diagnostics per subscriber before the oldest are dropped
    #[serde(default = "default_diagnostics_capacity")]
    pub diagnostics_capacity: usize,
}

fn default_max_listeners() -> i64 {
    crate::DEFAULT_MAX_LISTENERS
}

fn default_diagnostics_capacity() -> usize {
    crate::DEFAULT_DIAGNOSTICS_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_listeners: default_max_listeners(),
            diagnostics_capacity: default_diagnostics_capacity(),
        }
    }
}

impl Config {
    /// `<user config dir>/eventemitter/config.yml`, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("eventemitter").join("config.yml"))
    }

    /// Load from the user config file if it exists, else defaults
    ///
    /// The library never calls this on its own; a host application opts in
    /// and passes the result to `EventEmitter::with_config`.
    pub fn load_user() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load config from a YAML file; missing fields take their defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_listeners, 10);
        assert_eq!(config.diagnostics_capacity, 1024);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("max_listeners: -1\n").unwrap();
        assert_eq!(config.max_listeners, -1);
        assert_eq!(config.diagnostics_capacity, 1024);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("config.yml");

        let config = Config {
            max_listeners: 3,
            diagnostics_capacity: 16,
        };
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.yml");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_default_path_is_namespaced() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("eventemitter/config.yml"));
        }
    }
}
