//! 启动器
//!
//! 按固定顺序执行所有阶段，每个进程（每个启动器实例）只运行一次。

use super::context::ApplicationContext;
use super::deployment::{Deployment, PhaseContext};
use super::journal::PhaseJournal;
use super::phase::Phase;
use crate::config::BootstrapConfig;
use crate::errors::{BootstrapError, HookError};
use crate::infrastructure::component::{ComponentStatus, Layer};
use crate::infrastructure::container::ServiceContainer;
use crate::infrastructure::registry::ComponentRegistry;
use crate::log_error;
use crate::logging::OperationTimer;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// 启动器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl BootstrapState {
    pub fn name(&self) -> &'static str {
        match self {
            BootstrapState::Idle => "idle",
            BootstrapState::Running => "running",
            BootstrapState::Completed => "completed",
            BootstrapState::Failed => "failed",
        }
    }
}

/// 启动器
pub struct Bootstrapper<D: Deployment> {
    deployment: D,
    config: BootstrapConfig,
    state: Mutex<BootstrapState>,
}

impl<D: Deployment> Bootstrapper<D> {
    pub fn new(deployment: D, config: BootstrapConfig) -> Self {
        Self {
            deployment,
            config,
            state: Mutex::new(BootstrapState::Idle),
        }
    }

    pub fn with_defaults(deployment: D) -> Self {
        Self::new(deployment, BootstrapConfig::default())
    }

    pub fn deployment(&self) -> &D {
        &self.deployment
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.lock()
    }

    /// 执行启动流程
    ///
    /// 只能调用一次：之后的调用（无论上次成功、失败还是仍在运行）都返回
    /// [`BootstrapError::AlreadyStarted`]，不会再执行任何阶段。阶段失败不重试；
    /// 钩子中的 panic 不会被捕获。
    pub fn start(&self) -> Result<ApplicationContext, BootstrapError> {
        {
            let mut state = self.state.lock();
            if *state != BootstrapState::Idle {
                tracing::warn!(state = state.name(), "Bootstrap start rejected");
                return Err(BootstrapError::AlreadyStarted { state: state.name() });
            }
            *state = BootstrapState::Running;
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = tracing::info_span!("bootstrap", %run_id, deployment = self.deployment.name());
        let _enter = span.enter();
        let timer = OperationTimer::new("bootstrap").with_metadata("deployment", self.deployment.name());

        let registry = Arc::new(ComponentRegistry::new());
        let mut journal = PhaseJournal::new();

        let mut outcome = self.run(&registry, &mut journal);
        if outcome.is_ok() && self.config.verify_phase_order {
            outcome = journal.verify_complete();
        }

        match outcome {
            Ok(()) => {
                *self.state.lock() = BootstrapState::Completed;
                let elapsed = timer.finish();
                tracing::info!(
                    phases = journal.len(),
                    all_ready = registry.all_ready(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "Bootstrap completed"
                );
                Ok(ApplicationContext::new(run_id, started_at, registry, journal))
            }
            Err(err) => {
                *self.state.lock() = BootstrapState::Failed;
                log_error!(err, "bootstrap", phases_completed = journal.len());
                Err(err)
            }
        }
    }

    fn run(&self, registry: &ComponentRegistry, journal: &mut PhaseJournal) -> Result<(), BootstrapError> {
        // 顺序固定，不得调整
        self.initialize_error_management(registry, journal)?;
        self.initialize_global_dependency_management(registry, journal)?;
        self.initialize_components(registry, journal)
    }

    fn initialize_error_management(
        &self,
        registry: &ComponentRegistry,
        journal: &mut PhaseJournal,
    ) -> Result<(), BootstrapError> {
        self.run_phase(Phase::ErrorManagement, registry, journal, |ctx| {
            self.deployment.initialize_error_management(ctx);
            Ok(())
        })
    }

    fn initialize_global_dependency_management(
        &self,
        registry: &ComponentRegistry,
        journal: &mut PhaseJournal,
    ) -> Result<(), BootstrapError> {
        self.run_phase(Phase::AppComponent, registry, journal, |ctx| {
            Self::build_component(registry, Layer::Application, || {
                self.deployment
                    .initialize_app_component(ctx)
                    .map_err(|e| hook_failure(Phase::AppComponent, e))
            })?;
            if registry.status(Layer::Application) != ComponentStatus::Ready {
                tracing::warn!("Application component was not installed; first access will fail");
            }
            Ok(())
        })?;

        self.run_phase(Phase::DataComponent, registry, journal, |ctx| {
            Self::build_component(registry, Layer::Data, || {
                ctx.install(Layer::Data, ServiceContainer::new()).map(|_| ())
            })
        })?;

        self.run_phase(Phase::BusinessComponent, registry, journal, |ctx| {
            Self::build_component(registry, Layer::Business, || {
                let services = match registry.ready_component(Layer::Data) {
                    Some(data) => ServiceContainer::with_parent(data.services()),
                    None => ServiceContainer::new(),
                };
                ctx.install(Layer::Business, services).map(|_| ())
            })
        })?;

        self.run_phase(Phase::DependencyManagementInitialized, registry, journal, |ctx| {
            self.deployment
                .on_dependency_management_initialized(ctx)
                .map_err(|e| hook_failure(Phase::DependencyManagementInitialized, e))?;
            // 装配结束，组件从此只读
            registry.seal_all();
            Ok(())
        })
    }

    fn initialize_components(
        &self,
        registry: &ComponentRegistry,
        journal: &mut PhaseJournal,
    ) -> Result<(), BootstrapError> {
        self.run_phase(Phase::NetworkLayer, registry, journal, |ctx| {
            self.deployment
                .initialize_network_layer(ctx)
                .map_err(|e| hook_failure(Phase::NetworkLayer, e))
        })?;

        self.run_phase(Phase::CacheLayer, registry, journal, |ctx| {
            self.deployment
                .initialize_cache_layer(ctx)
                .map_err(|e| hook_failure(Phase::CacheLayer, e))
        })?;

        self.run_phase(Phase::BusinessLayer, registry, journal, |ctx| {
            Self::initialize_business_layer(registry);
            // 扩展步骤总是在基础步骤之后
            self.deployment
                .initialize_extra_components(ctx)
                .map_err(|e| hook_failure(Phase::BusinessLayer, e))
        })
    }

    fn initialize_business_layer(registry: &ComponentRegistry) {
        let services = registry
            .ready_component(Layer::Business)
            .map(|component| component.services().len())
            .unwrap_or(0);
        tracing::debug!(services, "Business layer initialized");
    }

    /// 在 begin/finish 之间构造某一层组件
    fn build_component<F>(registry: &ComponentRegistry, layer: Layer, build: F) -> Result<(), BootstrapError>
    where
        F: FnOnce() -> Result<(), BootstrapError>,
    {
        registry.begin(layer)?;
        let result = build();
        registry.finish(layer, result.is_ok());
        result
    }

    fn run_phase<F>(
        &self,
        phase: Phase,
        registry: &ComponentRegistry,
        journal: &mut PhaseJournal,
        step: F,
    ) -> Result<(), BootstrapError>
    where
        F: FnOnce(&mut PhaseContext<'_>) -> Result<(), BootstrapError>,
    {
        tracing::debug!(phase = %phase, position = phase.position(), "Phase started");
        let started_at = Utc::now();
        let timer = OperationTimer::new(phase.name());

        let mut ctx = PhaseContext::new(phase, registry, &self.config);
        let result = step(&mut ctx);

        journal.record(phase, started_at, timer.finish())?;
        result
    }
}

/// 钩子返回的启动错误保持原有分类，其它错误包装为阶段失败
fn hook_failure(phase: Phase, err: HookError) -> BootstrapError {
    match err.downcast::<BootstrapError>() {
        Ok(inner) => *inner,
        Err(source) => BootstrapError::PhaseFailed { phase, source },
    }
}
