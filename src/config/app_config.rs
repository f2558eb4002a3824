use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use super::loader::ConfigLoader;

// Configuration location constants
pub const CONFIG_DIR_NAME: &str = "clean-sample";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Environment variable overrides
pub const ENV_ENVIRONMENT: &str = "CLEAN_SAMPLE_ENV";
pub const ENV_LOG_LEVEL: &str = "CLEAN_SAMPLE_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CLEAN_SAMPLE_LOG_FORMAT";
pub const ENV_VERIFY_ORDER: &str = "CLEAN_SAMPLE_VERIFY_ORDER";
pub const ENV_PREFIX: &str = "CLEAN_SAMPLE_";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                field: "environment",
                value: s.to_string(),
            }),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.format",
                value: s.to_string(),
            }),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main bootstrap configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapConfig {
    pub environment: Environment,
    /// Check the executed phases against the fixed order before handing out the context
    pub verify_phase_order: bool,
    pub logging: LoggingSettings,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            verify_phase_order: true,
            logging: LoggingSettings::default(),
        }
    }
}

/// Partial logging section for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

/// Partial configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialBootstrapConfig {
    pub environment: Option<Environment>,
    pub verify_phase_order: Option<bool>,
    pub logging: Option<PartialLoggingSettings>,
}

impl BootstrapConfig {
    /// Load configuration from the user config directory and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration with custom base path (for testing)
    pub fn load_with_base_path(base_path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_base_path(base_path).load_config()
    }

    /// Create config from partial config and environment; environment wins over the file
    pub fn from_partial_and_env(
        partial: Option<PartialBootstrapConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let defaults = BootstrapConfig::default();
        let logging = partial.logging.unwrap_or_default();

        let environment = match env_map.get(ENV_ENVIRONMENT) {
            Some(value) => value.parse()?,
            None => partial.environment.unwrap_or(defaults.environment),
        };

        let verify_phase_order = match env_map.get(ENV_VERIFY_ORDER) {
            Some(value) => parse_bool(ENV_VERIFY_ORDER, value)?,
            None => partial.verify_phase_order.unwrap_or(defaults.verify_phase_order),
        };

        let level = env_map
            .get(ENV_LOG_LEVEL)
            .cloned()
            .or(logging.level)
            .unwrap_or(defaults.logging.level);

        let format = match env_map.get(ENV_LOG_FORMAT) {
            Some(value) => value.parse()?,
            None => logging.format.unwrap_or(defaults.logging.format),
        };

        let config = BootstrapConfig {
            environment,
            verify_phase_order,
            logging: LoggingSettings { level, format },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration; `logging.level` accepts any `EnvFilter` directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        EnvFilter::try_new(&self.logging.level).map_err(|_| ConfigError::InvalidValue {
            field: "logging.level",
            value: self.logging.level.clone(),
        })?;
        Ok(())
    }
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}
