use crate::config::{BootstrapConfig, Environment, LogFormat};
use crate::errors::AppError;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 环境
    pub environment: Environment,
    /// 日志级别（EnvFilter 指令）
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: true,
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            level: "info".to_string(),
            format: LogFormat::Json,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 创建测试环境配置
    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            level: "error".to_string(),
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
        }
    }

    /// 以环境预设为基础，应用配置文件中的级别和格式
    pub fn from_bootstrap_config(config: &BootstrapConfig) -> Self {
        let preset = match config.environment {
            Environment::Development => Self::development(),
            Environment::Testing => Self::testing(),
            Environment::Production => Self::production(),
        };
        Self {
            level: config.logging.level.clone(),
            format: config.logging.format,
            ..preset
        }
    }
}

/// 初始化日志系统
///
/// 已经存在全局 subscriber 时返回 `Ok(false)`，不覆盖原有设置。
pub fn init_logging(config: &LoggingConfig) -> Result<bool, AppError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| AppError::Logging(format!("invalid log level '{}': {}", config.level, e)))?;
    let ansi = config.environment != Environment::Production;

    let installed = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_ansi(ansi),
            )
            .try_init()
            .is_ok(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .compact()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_ansi(ansi),
            )
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids),
            )
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            environment = ?config.environment,
            level = %config.level,
            format = ?config.format,
            "Logging system initialized"
        );
    }

    Ok(installed)
}

/// 操作性能计时器
pub struct OperationTimer {
    start: Instant,
    operation: String,
    metadata: Vec<(String, String)>,
}

impl OperationTimer {
    /// 创建新的计时器
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: Vec::new(),
        }
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// 完成计时并记录日志，返回耗时
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();

        tracing::debug!(
            operation = %self.operation,
            duration_us = duration.as_micros() as u64,
            metadata = ?self.metadata,
            "Operation completed"
        );
        duration
    }

    /// 获取当前经过时间
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// 错误日志宏
#[macro_export]
macro_rules! log_error {
    ($error:expr, $operation:expr $(, $field:ident = $value:expr)* $(,)?) => {
        tracing::error!(
            error = %$error,
            operation = $operation,
            $($field = $value,)*
            "Operation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_creation() {
        let dev_config = LoggingConfig::development();
        assert_eq!(dev_config.environment, Environment::Development);
        assert_eq!(dev_config.level, "debug");
        assert_eq!(dev_config.format, LogFormat::Pretty);

        let prod_config = LoggingConfig::production();
        assert_eq!(prod_config.environment, Environment::Production);
        assert_eq!(prod_config.format, LogFormat::Json);

        let test_config = LoggingConfig::testing();
        assert_eq!(test_config.level, "error");
        assert_eq!(test_config.format, LogFormat::Compact);
    }

    #[test]
    fn test_config_file_overrides_preset() {
        let mut config = BootstrapConfig::default();
        config.environment = Environment::Production;
        config.logging.level = "warn".to_string();
        config.logging.format = LogFormat::Compact;

        let logging = LoggingConfig::from_bootstrap_config(&config);
        assert_eq!(logging.environment, Environment::Production);
        assert_eq!(logging.level, "warn");
        assert_eq!(logging.format, LogFormat::Compact);
        assert!(!logging.show_target);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "clean_sample=loud".to_string(),
            ..LoggingConfig::testing()
        };
        assert!(matches!(init_logging(&config), Err(AppError::Logging(_))));
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test_operation")
            .with_metadata("param1", "value1")
            .with_metadata("param2", "value2");

        assert_eq!(timer.operation, "test_operation");
        assert_eq!(timer.metadata.len(), 2);

        std::thread::sleep(Duration::from_millis(1));
        assert!(timer.elapsed() >= Duration::from_millis(1));
        assert!(timer.finish() >= Duration::from_millis(1));
    }
}
