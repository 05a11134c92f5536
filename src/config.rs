//! Configuration management for the webhook schema engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (webhook-schemas.toml)
//! - Environment variables (WEBHOOK_SCHEMAS__*)
//!
//! ## Example config file (webhook-schemas.toml):
//! ```toml
//! [registry]
//! schema_dir = "./schemas"
//!
//! [validation]
//! mode = "strict"
//! missing_version = "reject"
//!
//! [logging]
//! filter = "webhook_schemas=debug"
//! ```
//!
//! Configuration only picks defaults for callers such as the inspect binary.
//! Library calls always take their mode and options as arguments.

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dispatch::{DecodeOptions, MissingVersionPolicy};
use crate::validate::Mode;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where schema definitions come from
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Validation defaults
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Load definitions from this directory instead of the embedded set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_dir: Option<PathBuf>,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Policy for undeclared keys
    #[serde(default)]
    pub mode: Mode,

    /// What to do with payloads that carry no `meta.version`
    #[serde(default)]
    pub missing_version: MissingVersionPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl EngineConfig {
    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "webhook-schemas.toml",
            ".webhook-schemas.toml",
            "config/webhook-schemas.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("ai", "huntflow", "webhook-schemas") {
            let xdg_config = config_dir.config_dir().join("webhook-schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("WEBHOOK_SCHEMAS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Decode options seeded from the validation section
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            mode: self.validation.mode,
            missing_version: self.validation.missing_version,
            version_hint: None,
        }
    }
}
