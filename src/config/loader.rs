use crate::errors::ConfigError;
use std::{collections::HashMap, env, fs, path::PathBuf};

use super::app_config::{
    BootstrapConfig, PartialBootstrapConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_PREFIX,
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self {
            base_path: None,
            explicit_file: None,
        }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
            explicit_file: None,
        }
    }

    /// Create a config loader for an explicit file, which must exist
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            base_path: None,
            explicit_file: Some(path),
        }
    }

    /// Load complete configuration
    pub fn load_config(&self) -> Result<BootstrapConfig, ConfigError> {
        let partial = self.load_partial_config()?;
        let env_map = self.collect_env_vars();
        BootstrapConfig::from_partial_and_env(partial, &env_map)
    }

    /// Resolve the config file path
    pub fn config_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(file) = &self.explicit_file {
            return Ok(file.clone());
        }
        let base = match &self.base_path {
            Some(base_path) => base_path.clone(),
            None => dirs::config_dir().ok_or(ConfigError::NoConfigDir)?,
        };
        Ok(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load partial config from file; a missing default file means "use defaults"
    fn load_partial_config(&self) -> Result<Option<PartialBootstrapConfig>, ConfigError> {
        let path = self.config_path()?;
        let path_display = path.display().to_string();

        if !path.exists() && self.explicit_file.is_none() {
            tracing::debug!(path = %path_display, "No configuration file, using defaults");
            return Ok(None);
        }

        let content =
            fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path_display.clone(), e))?;
        let partial =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParse(path_display.clone(), e))?;
        tracing::debug!(path = %path_display, "Configuration file loaded");
        Ok(Some(partial))
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)).collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
