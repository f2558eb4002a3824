//! 业务层：交互器

use super::data::{FeatureItem, FeatureRepository};
use std::sync::Arc;

/// 功能 2 的详情交互器
#[derive(Debug)]
pub struct Feature2Interactor {
    repository: Arc<FeatureRepository>,
}

impl Feature2Interactor {
    pub fn new(repository: Arc<FeatureRepository>) -> Self {
        Self { repository }
    }

    pub fn details(&self, id: u32) -> Option<FeatureItem> {
        self.repository.find(id).cloned()
    }

    pub fn titles(&self) -> Vec<String> {
        self.repository.all().map(|item| item.title.clone()).collect()
    }
}
