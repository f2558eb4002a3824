//! 示例部署
//!
//! 应用组件提供 `AppInfo` 和交互器绑定，两个界面都从应用组件注入；
//! 数据组件提供功能条目仓库，交互器经由业务组件（回退到数据组件）解析仓库。

pub mod activities;
pub mod business;
pub mod data;

use crate::bootstrap::{Deployment, HookResult, PhaseContext};
use crate::config::Environment;
use crate::infrastructure::component::Layer;
use crate::infrastructure::container::ServiceContainer;
use serde::Serialize;

pub use activities::{Feature2DetailsActivity, SampleActivity};
pub use business::Feature2Interactor;
pub use data::{FeatureItem, FeatureRepository};

/// 应用信息，由应用组件提供
#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub environment: Environment,
}

/// 示例部署
#[derive(Debug, Clone)]
pub struct SampleDeployment {
    install_panic_hook: bool,
}

impl SampleDeployment {
    pub fn new() -> Self {
        Self {
            install_panic_hook: true,
        }
    }

    /// 不替换进程级 panic hook（测试中使用）
    pub fn without_panic_hook() -> Self {
        Self {
            install_panic_hook: false,
        }
    }
}

impl Default for SampleDeployment {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployment for SampleDeployment {
    fn name(&self) -> &str {
        "sample"
    }

    fn initialize_error_management(&self, _ctx: &PhaseContext<'_>) {
        if !self.install_panic_hook {
            return;
        }
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(panic = %info, "Unrecoverable error");
            previous(info);
        }));
    }

    fn initialize_app_component(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        let services = ServiceContainer::new();
        services.register_instance(AppInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: ctx.config().environment,
        })?;
        ctx.install(Layer::Application, services)?;
        Ok(())
    }

    fn on_dependency_management_initialized(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        let data = ctx.component(Layer::Data)?;
        data.services().register_instance(FeatureRepository::with_seed_data())?;

        // 交互器绑定在应用组件上，此时应用组件尚未封存
        let app = ctx.component(Layer::Application)?;
        let business = ctx.component(Layer::Business)?;
        app.services().register(move |_| {
            Ok(Feature2Interactor::new(business.resolve::<FeatureRepository>()?))
        })?;

        tracing::debug!(
            app_services = app.services().len(),
            data_services = data.services().len(),
            "Sample components wired"
        );
        Ok(())
    }

    fn initialize_network_layer(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        tracing::info!(environment = ?ctx.config().environment, "Network layer initialized");
        Ok(())
    }

    fn initialize_cache_layer(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        tracing::info!("Cache layer initialized");
        Ok(())
    }
}
