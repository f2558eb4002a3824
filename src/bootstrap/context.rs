//! 启动完成后的应用上下文
//!
//! 代替全局单例：`Bootstrapper::start` 返回上下文，使用方显式持有并传递。

use super::journal::PhaseJournal;
use crate::errors::BootstrapError;
use crate::infrastructure::component::{Component, ComponentStatus, InjectionTarget, Layer};
use crate::infrastructure::registry::ComponentRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug)]
pub struct ApplicationContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    registry: Arc<ComponentRegistry>,
    journal: PhaseJournal,
}

impl ApplicationContext {
    pub(crate) fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        registry: Arc<ComponentRegistry>,
        journal: PhaseJournal,
    ) -> Self {
        Self {
            run_id,
            started_at,
            registry,
            journal,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn journal(&self) -> &PhaseJournal {
        &self.journal
    }

    pub fn get_container(&self, layer: Layer) -> Result<Arc<Component>, BootstrapError> {
        self.registry.get_container(layer)
    }

    /// 获取已就绪的业务组件
    pub fn business_component(&self) -> Result<Arc<Component>, BootstrapError> {
        self.registry.business_component()
    }

    pub fn inject<T: InjectionTarget>(&self, target: &mut T) -> Result<(), BootstrapError> {
        self.registry.inject(target)
    }

    /// 生成启动报告
    pub fn report(&self) -> BootstrapReport {
        BootstrapReport {
            run_id: self.run_id,
            started_at: self.started_at,
            components: self
                .registry
                .snapshot()
                .into_iter()
                .map(|(layer, status)| ComponentReport { layer, status })
                .collect(),
            journal: self.journal.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentReport {
    pub layer: Layer,
    pub status: ComponentStatus,
}

/// 启动报告
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub components: Vec<ComponentReport>,
    pub journal: PhaseJournal,
}
