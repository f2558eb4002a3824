//! 数据层：功能条目仓库

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureItem {
    pub id: u32,
    pub title: String,
    pub description: String,
}

/// 内存中的功能条目仓库
#[derive(Debug, Default)]
pub struct FeatureRepository {
    items: BTreeMap<u32, FeatureItem>,
}

impl FeatureRepository {
    pub fn new(items: impl IntoIterator<Item = FeatureItem>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
        }
    }

    /// 示例数据
    pub fn with_seed_data() -> Self {
        Self::new([
            FeatureItem {
                id: 1,
                title: "Projects".to_string(),
                description: "List of projects visible to the current user".to_string(),
            },
            FeatureItem {
                id: 2,
                title: "Tasks".to_string(),
                description: "Tasks assigned to the current user".to_string(),
            },
        ])
    }

    pub fn find(&self, id: u32) -> Option<&FeatureItem> {
        self.items.get(&id)
    }

    pub fn all(&self) -> impl Iterator<Item = &FeatureItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
