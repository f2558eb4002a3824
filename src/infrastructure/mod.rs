//! 基础设施层
//!
//! 提供依赖管理的具体实现：
//! - 服务容器（按类型注册与解析）
//! - 架构层组件与注入目标
//! - 组件注册表

pub mod component;
pub mod container;
pub mod registry;

// 重新导出API
pub use component::{Component, ComponentStatus, InjectionTarget, Layer};
pub use container::{ContainerError, ContainerStats, ServiceContainer};
pub use registry::ComponentRegistry;
