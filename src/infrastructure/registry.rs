//! 组件注册表
//!
//! 持有应用层、数据层、业务层三个组件。每个槽位只能由所属阶段写入一次，
//! 之后任意多个读取方共享。

use super::component::{Component, ComponentStatus, InjectionTarget, Layer};
use crate::errors::BootstrapError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct ComponentSlot {
    status: ComponentStatus,
    /// 所属阶段是否已经执行过
    owner_ran: bool,
    component: Option<Arc<Component>>,
}

impl ComponentSlot {
    fn new() -> Self {
        Self {
            status: ComponentStatus::Uninitialized,
            owner_ran: false,
            component: None,
        }
    }
}

/// 组件注册表
#[derive(Debug)]
pub struct ComponentRegistry {
    slots: RwLock<HashMap<Layer, ComponentSlot>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        let slots = Layer::ALL
            .iter()
            .map(|layer| (*layer, ComponentSlot::new()))
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// 获取某一层组件的状态
    pub fn status(&self, layer: Layer) -> ComponentStatus {
        self.slots
            .read()
            .get(&layer)
            .map(|slot| slot.status)
            .unwrap_or(ComponentStatus::Uninitialized)
    }

    /// 获取某一层已就绪的组件
    ///
    /// - 所属阶段尚未执行或仍在构造中：顺序违规
    /// - 所属阶段已执行但组件缺失：配置错误
    /// - 应用组件是整个对象图的根，它缺失时访问任何层都是配置错误
    pub fn get_container(&self, layer: Layer) -> Result<Arc<Component>, BootstrapError> {
        let slots = self.slots.read();

        if layer != Layer::Application {
            if let Some(app) = slots.get(&Layer::Application) {
                if app.owner_ran && app.status != ComponentStatus::Ready && app.status != ComponentStatus::Initializing {
                    return Err(BootstrapError::Unconfigured {
                        layer,
                        reason: "the application component was never constructed".to_string(),
                    });
                }
            }
        }

        let slot = slots
            .get(&layer)
            .ok_or(BootstrapError::NotInitialized { layer })?;

        match (slot.status, &slot.component) {
            (ComponentStatus::Ready, Some(component)) => Ok(component.clone()),
            (ComponentStatus::Initializing, _) => Err(BootstrapError::NotInitialized { layer }),
            _ if slot.owner_ran => Err(BootstrapError::Unconfigured {
                layer,
                reason: format!("the {} phase completed without installing it", layer),
            }),
            _ => Err(BootstrapError::NotInitialized { layer }),
        }
    }

    /// 获取业务层组件
    pub fn business_component(&self) -> Result<Arc<Component>, BootstrapError> {
        self.get_container(Layer::Business)
    }

    /// 向注入目标填充依赖
    pub fn inject<T: InjectionTarget>(&self, target: &mut T) -> Result<(), BootstrapError> {
        let component = self.get_container(T::LAYER)?;
        target
            .inject_from(&component)
            .map_err(|source| BootstrapError::Injection {
                target: target.target_name(),
                source,
            })
    }

    /// 已就绪的组件，不做访问规则检查（启动器内部使用）
    pub(crate) fn ready_component(&self, layer: Layer) -> Option<Arc<Component>> {
        let slots = self.slots.read();
        slots
            .get(&layer)
            .filter(|slot| slot.status == ComponentStatus::Ready)
            .and_then(|slot| slot.component.clone())
    }

    /// 所属阶段开始构造组件
    pub(crate) fn begin(&self, layer: Layer) -> Result<(), BootstrapError> {
        let mut slots = self.slots.write();
        let slot = slots.entry(layer).or_insert_with(ComponentSlot::new);
        if slot.owner_ran {
            return Err(BootstrapError::AlreadyInstalled { layer });
        }
        slot.owner_ran = true;
        slot.status = ComponentStatus::Initializing;
        Ok(())
    }

    /// 发布构造完成的组件
    pub(crate) fn publish(&self, component: Component) -> Result<Arc<Component>, BootstrapError> {
        let layer = component.layer();
        let mut slots = self.slots.write();
        let slot = slots.entry(layer).or_insert_with(ComponentSlot::new);
        if slot.status != ComponentStatus::Initializing {
            return Err(if slot.component.is_some() {
                BootstrapError::AlreadyInstalled { layer }
            } else {
                BootstrapError::NotInitialized { layer }
            });
        }
        let component = Arc::new(component);
        slot.component = Some(component.clone());
        slot.status = ComponentStatus::Ready;
        Ok(component)
    }

    /// 结束所属阶段；组件未被发布时回到未初始化状态
    pub(crate) fn finish(&self, layer: Layer, succeeded: bool) {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(&layer) {
            match (succeeded, slot.status) {
                (_, ComponentStatus::Ready) => {}
                (true, _) => slot.status = ComponentStatus::Uninitialized,
                (false, _) => slot.status = ComponentStatus::Failed,
            }
        }
    }

    /// 封存所有已就绪组件
    pub(crate) fn seal_all(&self) {
        let slots = self.slots.read();
        for component in slots.values().filter_map(|slot| slot.component.as_ref()) {
            component.seal();
        }
    }

    /// 所有组件的状态快照
    pub fn snapshot(&self) -> Vec<(Layer, ComponentStatus)> {
        let slots = self.slots.read();
        Layer::ALL
            .iter()
            .map(|layer| {
                let status = slots
                    .get(layer)
                    .map(|slot| slot.status)
                    .unwrap_or(ComponentStatus::Uninitialized);
                (*layer, status)
            })
            .collect()
    }

    /// 三个组件是否都已就绪
    pub fn all_ready(&self) -> bool {
        self.snapshot()
            .iter()
            .all(|(_, status)| *status == ComponentStatus::Ready)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
