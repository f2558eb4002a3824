pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;
#[cfg(feature = "sample")]
pub mod sample;

// Re-export commonly used items for convenience
pub use bootstrap::{ApplicationContext, Bootstrapper, Deployment, HookResult, Phase, PhaseContext};
pub use config::BootstrapConfig;
pub use errors::{AppError, BootstrapError};
pub use infrastructure::{Component, InjectionTarget, Layer, ServiceContainer};
