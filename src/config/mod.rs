pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{BootstrapConfig, Environment, LogFormat, LoggingSettings};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_ENVIRONMENT, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    ENV_VERIFY_ORDER,
};
