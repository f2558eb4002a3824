//! 注入目标：两个示例界面

use super::business::Feature2Interactor;
use super::AppInfo;
use crate::infrastructure::component::{Component, InjectionTarget, Layer};
use crate::infrastructure::container::ContainerError;
use std::sync::Arc;

/// 首页，依赖应用组件
#[derive(Debug, Default)]
pub struct SampleActivity {
    app_info: Option<Arc<AppInfo>>,
}

impl SampleActivity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_info(&self) -> Option<&AppInfo> {
        self.app_info.as_deref()
    }

    pub fn title(&self) -> String {
        match &self.app_info {
            Some(info) => format!("{} {} ({:?})", info.name, info.version, info.environment),
            None => "<not injected>".to_string(),
        }
    }
}

impl InjectionTarget for SampleActivity {
    const LAYER: Layer = Layer::Application;

    fn inject_from(&mut self, component: &Component) -> Result<(), ContainerError> {
        self.app_info = Some(component.resolve::<AppInfo>()?);
        Ok(())
    }
}

/// 功能 2 详情页，交互器绑定在应用组件上
#[derive(Debug)]
pub struct Feature2DetailsActivity {
    item_id: u32,
    interactor: Option<Arc<Feature2Interactor>>,
}

impl Feature2DetailsActivity {
    pub fn new(item_id: u32) -> Self {
        Self {
            item_id,
            interactor: None,
        }
    }

    pub fn is_injected(&self) -> bool {
        self.interactor.is_some()
    }

    pub fn render(&self) -> String {
        let Some(interactor) = &self.interactor else {
            return "<not injected>".to_string();
        };
        match interactor.details(self.item_id) {
            Some(item) => format!("#{} {}: {}", item.id, item.title, item.description),
            None => format!("#{} not found", self.item_id),
        }
    }
}

impl InjectionTarget for Feature2DetailsActivity {
    const LAYER: Layer = Layer::Application;

    fn inject_from(&mut self, component: &Component) -> Result<(), ContainerError> {
        self.interactor = Some(component.resolve::<Feature2Interactor>()?);
        Ok(())
    }
}
