//! 组件抽象层
//!
//! 定义架构层、组件（某一层的对象图）以及注入目标

use super::container::{ContainerError, ServiceContainer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 架构层
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// 应用层（UI 入口所在的对象图）
    Application,
    /// 数据层
    Data,
    /// 业务层
    Business,
}

impl Layer {
    /// 所有层，按构造顺序排列
    pub const ALL: [Layer; 3] = [Layer::Application, Layer::Data, Layer::Business];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Application => "application",
            Layer::Data => "data",
            Layer::Business => "business",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// 组件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// 未初始化
    Uninitialized,
    /// 初始化中
    Initializing,
    /// 已就绪
    Ready,
    /// 初始化失败
    Failed,
}

/// 某一层的对象图
///
/// 组件只在完全构造之后才会被发布到注册表，读取方永远看不到半成品。
#[derive(Debug)]
pub struct Component {
    id: Uuid,
    layer: Layer,
    services: ServiceContainer,
}

impl Component {
    pub fn new(layer: Layer, services: ServiceContainer) -> Self {
        Self {
            id: Uuid::new_v4(),
            layer,
            services,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// 底层服务容器，在依赖管理阶段结束前可以继续注册（跨组件装配）
    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    /// 从组件中解析服务
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        self.services.resolve::<T>()
    }

    pub(crate) fn seal(&self) {
        self.services.seal();
    }
}

/// 注入目标
///
/// 目标声明自己依赖哪一层的组件，注入时从就绪的组件中填充自身字段。
pub trait InjectionTarget {
    /// 目标依赖的层
    const LAYER: Layer;

    /// 从组件中填充依赖
    fn inject_from(&mut self, component: &Component) -> Result<(), ContainerError>;

    /// 目标名称（用于错误信息）
    fn target_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order_and_names() {
        assert_eq!(Layer::ALL, [Layer::Application, Layer::Data, Layer::Business]);
        assert_eq!(Layer::Business.to_string(), "business");
        assert_eq!(
            serde_json::to_string(&Layer::Application).unwrap(),
            "\"application\""
        );
    }

    #[test]
    fn test_component_resolves_from_services() {
        let services = ServiceContainer::new();
        services.register_instance(String::from("repo")).unwrap();

        let component = Component::new(Layer::Data, services);
        assert_eq!(component.layer(), Layer::Data);
        assert_eq!(component.resolve::<String>().unwrap().as_str(), "repo");
    }
}
