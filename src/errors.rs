use crate::bootstrap::Phase;
use crate::infrastructure::component::Layer;
use crate::infrastructure::container::ContainerError;
use thiserror::Error;

/// 钩子返回的错误类型
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),
    #[error("Logging error: {0}")]
    Logging(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for configuration field '{field}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("Unable to determine the user configuration directory")]
    NoConfigDir,
}

/// 启动过程中的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 钩子未实现或实现错误（例如应用组件没有构造）
    Configuration,
    /// 在所属阶段完成之前访问组件或注入目标
    OrderingViolation,
    /// 某个阶段失败
    PhaseFailure,
    /// 重复启动
    Reentry,
    /// 容器内部错误
    Container,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("{layer} component accessed before it was initialized")]
    NotInitialized { layer: Layer },

    #[error("{layer} component is not configured: {reason}")]
    Unconfigured { layer: Layer, reason: String },

    #[error("phase order violated: expected {expected}, found {found}")]
    PhaseOrder { expected: String, found: String },

    #[error("phase {phase} cannot install the {layer} component")]
    ForeignInstall { phase: Phase, layer: Layer },

    #[error("{layer} component has already been installed")]
    AlreadyInstalled { layer: Layer },

    #[error("phase {phase} failed: {source}")]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: HookError,
    },

    #[error("bootstrap already {state}; start may only run once")]
    AlreadyStarted { state: &'static str },

    #[error("injection into {target} failed: {source}")]
    Injection {
        target: &'static str,
        #[source]
        source: ContainerError,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::Unconfigured { .. } => ErrorKind::Configuration,
            BootstrapError::NotInitialized { .. }
            | BootstrapError::PhaseOrder { .. }
            | BootstrapError::ForeignInstall { .. }
            | BootstrapError::AlreadyInstalled { .. } => ErrorKind::OrderingViolation,
            BootstrapError::PhaseFailed { .. } => ErrorKind::PhaseFailure,
            BootstrapError::AlreadyStarted { .. } => ErrorKind::Reentry,
            BootstrapError::Injection { .. } | BootstrapError::Container(_) => ErrorKind::Container,
        }
    }

    pub fn is_ordering_violation(&self) -> bool {
        self.kind() == ErrorKind::OrderingViolation
    }

    pub fn is_configuration_error(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}
