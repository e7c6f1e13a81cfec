//! Configuration management for the extraneous purchase predictor

use crate::models::inference::DEFAULT_THRESHOLD;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable prefix, e.g. `EXTRANEOUS_MODEL__THRESHOLD=0.6`
pub const ENV_PREFIX: &str = "EXTRANEOUS";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model bundle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the JSON artifact bundle
    pub bundle_path: String,
    /// Probability at or above which a purchase is labeled extraneous
    pub threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            bundle_path: "models/extraneous_model.json".to_string(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file if it exists, otherwise
    /// built-in defaults. Environment overrides apply in both cases.
    pub fn load() -> Result<Self> {
        Self::build(DEFAULT_CONFIG_PATH, false)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(path, true)
    }

    fn build<P: AsRef<Path>>(path: P, required: bool) -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("Failed to encode default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject values the predictor would refuse later
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.threshold) {
            anyhow::bail!(
                "model.threshold must be within [0, 1], got {}",
                self.model.threshold
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.bundle_path, "models/extraneous_model.json");
        assert_eq!(config.model.threshold, 0.5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[model]\nbundle_path = \"/opt/models/bundle.json\"\nthreshold = 0.65\n\n[logging]\nlevel = \"debug\"\nformat = \"json\""
        )
        .unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.bundle_path, "/opt/models/bundle.json");
        assert_eq!(config.model.threshold, 0.65);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[model]\nthreshold = 0.7").unwrap();

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.threshold, 0.7);
        assert_eq!(config.model.bundle_path, "models/extraneous_model.json");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[model]\nthreshold = 1.5").unwrap();

        assert!(AppConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_missing_required_file() {
        assert!(AppConfig::load_from_path("/nonexistent/config.toml").is_err());
    }
}
