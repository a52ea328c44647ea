//! Configuration module
//!
//! Engine settings, the config file that carries them and environment
//! overrides.

pub mod env;
pub mod file;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::output::OutputFormat;
use crate::utils::logger::LogLevel;

pub use env::EnvConfig;
pub use file::ConfigFile;

/// Engine settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stop the event pump once every started test has finished
    pub autostop: bool,

    /// Sort the loaded tree by name before running
    pub sort: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Console output format (progress, jsonl, quiet)
    pub format: String,

    /// Echo test output in progress mode
    pub show_output: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            autostop: false,
            sort: false,
            log_level: "info".to_string(),
            format: "progress".to_string(),
            show_output: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON config")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if LogLevel::from_str(&self.log_level).is_none() {
            anyhow::bail!("Unknown log level: {}", self.log_level);
        }
        if OutputFormat::from_str(&self.format).is_none() {
            anyhow::bail!(
                "Unknown output format: {}. Valid formats: progress, jsonl, quiet",
                self.format
            );
        }
        Ok(())
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_str(&self.log_level).unwrap_or(LogLevel::Info)
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_str(&self.format).unwrap_or(OutputFormat::Progress)
    }
}

/// Check if file is YAML based on extension
pub(crate) fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(!config.autostop);
        assert_eq!(config.log_level(), LogLevel::Info);
        assert_eq!(config.output_format(), OutputFormat::Progress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let config = EngineConfig {
            autostop: true,
            format: "jsonl".to_string(),
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.yml");
        std::fs::write(&path, "sort: true\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert!(config.sort);
        assert_eq!(config.format, "progress");
    }

    #[test]
    fn test_validate_rejects_unknown_values() {
        let config = EngineConfig {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            format: "xml".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_yaml_file() {
        assert!(is_yaml_file(Path::new("a/b.yaml")));
        assert!(is_yaml_file(Path::new("b.yml")));
        assert!(!is_yaml_file(Path::new("b.json")));
    }
}
