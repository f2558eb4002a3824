//! 集成测试共享的部署实现

#![allow(dead_code)]

use clean_sample::bootstrap::{Deployment, HookResult, Phase, PhaseContext};
use clean_sample::infrastructure::{Component, ContainerError, InjectionTarget, Layer, ServiceContainer};
use parking_lot::Mutex;
use std::sync::Arc;

/// 业务组件中注册的服务
#[derive(Debug)]
pub struct Greeting(pub String);

/// 依赖业务组件的注入目标
#[derive(Debug, Default)]
pub struct GreetingScreen {
    pub greeting: Option<Arc<Greeting>>,
}

impl InjectionTarget for GreetingScreen {
    const LAYER: Layer = Layer::Business;

    fn inject_from(&mut self, component: &Component) -> Result<(), ContainerError> {
        self.greeting = Some(component.resolve::<Greeting>()?);
        Ok(())
    }
}

/// 记录每个钩子调用顺序的部署
pub struct RecordingDeployment {
    calls: Arc<Mutex<Vec<&'static str>>>,
    install_app: bool,
    register_greeting: bool,
    fail_at: Option<Phase>,
    panic_at: Option<Phase>,
}

impl RecordingDeployment {
    /// 两个必需钩子都是空实现，只安装空的应用组件
    pub fn noop() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            install_app: true,
            register_greeting: false,
            fail_at: None,
            panic_at: None,
        }
    }

    pub fn with_greeting() -> Self {
        Self {
            register_greeting: true,
            ..Self::noop()
        }
    }

    /// 应用组件钩子故意不安装组件
    pub fn without_app_component() -> Self {
        Self {
            install_app: false,
            ..Self::noop()
        }
    }

    pub fn failing_at(phase: Phase) -> Self {
        Self {
            fail_at: Some(phase),
            ..Self::noop()
        }
    }

    pub fn panicking_at(phase: Phase) -> Self {
        Self {
            panic_at: Some(phase),
            ..Self::noop()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    fn enter(&self, phase: Phase, name: &'static str) -> HookResult {
        self.calls.lock().push(name);
        if self.panic_at == Some(phase) {
            panic!("hook {} panicked", name);
        }
        if self.fail_at == Some(phase) {
            return Err(format!("hook {} failed", name).into());
        }
        Ok(())
    }
}

impl Deployment for RecordingDeployment {
    fn name(&self) -> &str {
        "recording"
    }

    fn initialize_error_management(&self, _ctx: &PhaseContext<'_>) {
        self.calls.lock().push("error_management");
    }

    fn initialize_app_component(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        self.enter(Phase::AppComponent, "app_component")?;
        if self.install_app {
            ctx.install(Layer::Application, ServiceContainer::new())?;
        }
        Ok(())
    }

    fn on_dependency_management_initialized(&self, ctx: &mut PhaseContext<'_>) -> HookResult {
        self.enter(Phase::DependencyManagementInitialized, "dependency_management_initialized")?;
        if self.register_greeting {
            ctx.component(Layer::Business)?
                .services()
                .register_instance(Greeting("hello from business".to_string()))?;
        }
        Ok(())
    }

    fn initialize_network_layer(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        self.enter(Phase::NetworkLayer, "network_layer")
    }

    fn initialize_cache_layer(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        self.enter(Phase::CacheLayer, "cache_layer")
    }

    fn initialize_extra_components(&self, _ctx: &mut PhaseContext<'_>) -> HookResult {
        self.enter(Phase::BusinessLayer, "extra_components")
    }
}
