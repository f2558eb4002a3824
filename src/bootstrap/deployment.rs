//! 部署扩展点
//!
//! 部署方通过实现 [`Deployment`] 接入启动流程：
//! - 必须实现：构造应用组件、依赖管理完成后的回调
//! - 可以覆盖：错误管理、网络层、缓存层、额外组件
//! - 不可覆盖：阶段顺序、数据/业务组件构造、业务层初始化（由 [`Bootstrapper`] 私有实现）
//!
//! 可覆盖的步骤总是由启动器在基础步骤之后调用，部署方不需要也无法"先调用父类"。
//!
//! [`Bootstrapper`]: super::Bootstrapper

use super::phase::Phase;
use crate::config::BootstrapConfig;
use crate::errors::{BootstrapError, HookError};
use crate::infrastructure::component::{Component, Layer};
use crate::infrastructure::container::ServiceContainer;
use crate::infrastructure::registry::ComponentRegistry;
use std::sync::Arc;

pub type HookResult = Result<(), HookError>;

/// 阶段上下文，钩子通过它安装和读取组件
pub struct PhaseContext<'a> {
    phase: Phase,
    registry: &'a ComponentRegistry,
    config: &'a BootstrapConfig,
}

impl<'a> PhaseContext<'a> {
    pub(crate) fn new(phase: Phase, registry: &'a ComponentRegistry, config: &'a BootstrapConfig) -> Self {
        Self {
            phase,
            registry,
            config,
        }
    }

    /// 当前阶段
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &BootstrapConfig {
        self.config
    }

    /// 安装当前阶段负责的组件
    ///
    /// 只有 [`Phase::populates`] 指向 `layer` 的阶段可以安装该组件。
    pub fn install(&mut self, layer: Layer, services: ServiceContainer) -> Result<Arc<Component>, BootstrapError> {
        if self.phase.populates() != Some(layer) {
            return Err(BootstrapError::ForeignInstall {
                phase: self.phase,
                layer,
            });
        }
        let component = self.registry.publish(Component::new(layer, services))?;
        tracing::debug!(
            phase = %self.phase,
            layer = %layer,
            services = component.services().len(),
            "Component installed"
        );
        Ok(component)
    }

    /// 读取已就绪的组件
    pub fn component(&self, layer: Layer) -> Result<Arc<Component>, BootstrapError> {
        self.registry.get_container(layer)
    }
}

/// 部署方实现的启动钩子
pub trait Deployment: Send + Sync {
    /// 部署名称（用于日志）
    fn name(&self) -> &str {
        "deployment"
    }

    /// 初始化错误管理；此时还没有任何地方可以上报错误，因此不能失败
    fn initialize_error_management(&self, _ctx: &PhaseContext<'_>) {}

    /// 构造应用组件，必须调用 `ctx.install(Layer::Application, ..)`
    fn initialize_app_component(&self, ctx: &mut PhaseContext<'_>) -> HookResult;

    /// 三个组件构造完成后调用，可在此进行跨组件装配
    fn on_dependency_management_initialized(&self, ctx: &mut PhaseContext<'_>) -> HookResult;

    /// 初始化网络相关组件
    fn initialize_network_layer(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        Ok(())
    }

    /// 初始化全局缓存组件
    fn initialize_cache_layer(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        Ok(())
    }

    /// 在网络层、缓存层、业务层之后追加的组件初始化
    fn initialize_extra_components(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        Ok(())
    }
}

impl<D: Deployment + ?Sized> Deployment for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn initialize_error_management(&self, ctx: &PhaseContext<'_>) {
        (**self).initialize_error_management(ctx)
    }

    fn initialize_app_component(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        (**self).initialize_app_component(ctx)
    }

    fn on_dependency_management_initialized(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        (**self).on_dependency_management_initialized(ctx)
    }

    fn initialize_network_layer(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        (**self).initialize_network_layer(ctx)
    }

    fn initialize_cache_layer(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        (**self).initialize_cache_layer(ctx)
    }

    fn initialize_extra_components(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        (**self).initialize_extra_components(ctx)
    }
}
