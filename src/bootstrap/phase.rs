//! 启动阶段定义

use crate::infrastructure::component::Layer;
use serde::Serialize;
use std::fmt;

/// 阶段所属的启动步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ErrorManagement,
    DependencyManagement,
    Components,
}

/// 启动阶段
///
/// 顺序在编译期固定为 [`Phase::ORDER`]，部署方无法跳过或调整。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    ErrorManagement,
    AppComponent,
    DataComponent,
    BusinessComponent,
    DependencyManagementInitialized,
    NetworkLayer,
    CacheLayer,
    BusinessLayer,
}

impl Phase {
    /// 唯一合法的执行顺序
    pub const ORDER: [Phase; 8] = [
        Phase::ErrorManagement,
        Phase::AppComponent,
        Phase::DataComponent,
        Phase::BusinessComponent,
        Phase::DependencyManagementInitialized,
        Phase::NetworkLayer,
        Phase::CacheLayer,
        Phase::BusinessLayer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::ErrorManagement => "error_management",
            Phase::AppComponent => "app_component",
            Phase::DataComponent => "data_component",
            Phase::BusinessComponent => "business_component",
            Phase::DependencyManagementInitialized => "dependency_management_initialized",
            Phase::NetworkLayer => "network_layer",
            Phase::CacheLayer => "cache_layer",
            Phase::BusinessLayer => "business_layer",
        }
    }

    /// 在顺序中的位置（从 0 开始）
    pub fn position(&self) -> usize {
        Phase::ORDER
            .iter()
            .position(|phase| phase == self)
            .unwrap_or(Phase::ORDER.len())
    }

    /// 部署方可以选择覆盖、带默认空实现的阶段
    pub fn is_overridable(&self) -> bool {
        !self.is_sealed() && !self.is_required()
    }

    /// 由启动器自己实现、部署方无法替换的阶段
    pub fn is_sealed(&self) -> bool {
        matches!(
            self,
            Phase::DataComponent | Phase::BusinessComponent | Phase::BusinessLayer
        )
    }

    /// 部署方必须实现的阶段
    pub fn is_required(&self) -> bool {
        matches!(self, Phase::AppComponent | Phase::DependencyManagementInitialized)
    }

    /// 该阶段负责构造的组件
    pub fn populates(&self) -> Option<Layer> {
        match self {
            Phase::AppComponent => Some(Layer::Application),
            Phase::DataComponent => Some(Layer::Data),
            Phase::BusinessComponent => Some(Layer::Business),
            _ => None,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Phase::ErrorManagement => Stage::ErrorManagement,
            Phase::AppComponent
            | Phase::DataComponent
            | Phase::BusinessComponent
            | Phase::DependencyManagementInitialized => Stage::DependencyManagement,
            Phase::NetworkLayer | Phase::CacheLayer | Phase::BusinessLayer => Stage::Components,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
