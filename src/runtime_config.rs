//! # Runtime Configuration Module
//!
//! Settings read once at startup, from environment variables or a YAML file.
//!
//! ## Environment Variables
//!
//! ### `BRRTR_STRICT_FORMATS`
//!
//! `true` makes an unknown `format` on a string schema a compile-time
//! `UNSUPPORTED_FEATURE` error. Otherwise the format is logged and ignored.
//!
//! Default: `false`
//!
//! ### `BRRTR_LOG_*`
//!
//! See [`LogConfig::from_env`](crate::telemetry::LogConfig::from_env).
//!
//! ## Usage
//!
//! ```rust
//! use brrtrouter_params::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("strict formats: {}", config.validator.strict_formats);
//! ```
//!
//! ## YAML
//!
//! ```yaml
//! validator:
//!   strict_formats: true
//! log:
//!   log_level: debug
//!   format: pretty
//! ```

use crate::telemetry::LogConfig;
use crate::validator::ValidatorOptions;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Runtime configuration. Missing YAML sections fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Slice handed to route compilation
    pub validator: ValidatorOptions,
    pub log: LogConfig,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let strict_formats = env::var("BRRTR_STRICT_FORMATS")
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        RuntimeConfig {
            validator: ValidatorOptions { strict_formats },
            log: LogConfig::from_env(),
        }
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid runtime configuration")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        Self::from_yaml_str(&text)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::LogFormat;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("ON"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_yaml_partial_sections() {
        let config = RuntimeConfig::from_yaml_str("validator:\n  strict_formats: true\n").unwrap();
        assert!(config.validator.strict_formats);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.log_level, "info");
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.yaml");
        std::fs::write(&path, "log:\n  format: pretty\n").unwrap();
        let config = RuntimeConfig::from_yaml_file(&path).unwrap();
        assert!(!config.validator.strict_formats);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_yaml_rejects_wrong_types() {
        assert!(RuntimeConfig::from_yaml_str("validator:\n  strict_formats: [1]\n").is_err());
    }
}
