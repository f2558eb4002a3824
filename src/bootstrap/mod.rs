//! 应用启动流程
//!
//! ```text
//! 错误管理
//!   → 全局依赖管理：应用组件 → 数据组件 → 业务组件 → 依赖管理完成回调
//!   → 组件初始化：网络层 → 缓存层 → 业务层（→ 额外组件）
//! ```

pub mod context;
pub mod deployment;
pub mod journal;
pub mod phase;
pub mod sequencer;

pub use context::{ApplicationContext, BootstrapReport};
pub use deployment::{Deployment, HookResult, PhaseContext};
pub use journal::{PhaseJournal, PhaseRecord};
pub use phase::{Phase, Stage};
pub use sequencer::{BootstrapState, Bootstrapper};
