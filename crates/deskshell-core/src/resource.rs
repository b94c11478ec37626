//! Backing store configuration for the switchable resource.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ResourceId;

/// Immutable description of one backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Store identifier.
    pub id: ResourceId,

    /// Store copied when `id` has never been provisioned.
    pub template_id: ResourceId,

    /// Where the store for `id` lives on durable storage.
    pub storage_path: PathBuf,
}

/// Deterministic mapping from resource ids to store files.
///
/// ```text
/// <base_dir>/
/// ├── save_0.db    // copied from the bundled template
/// └── save_1.db    // copied from the bundled template on first use
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLayout {
    base_dir: PathBuf,
    template_path: PathBuf,
}

impl ResourceLayout {
    /// Create a layout rooted at `base_dir`, bootstrapping from the bundled
    /// template store at `template_path`.
    pub fn new(base_dir: impl Into<PathBuf>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            template_path: template_path.into(),
        }
    }

    /// File name of the store for `id`.
    pub fn store_name(id: ResourceId) -> String {
        format!("save_{id}.db")
    }

    /// Directory that holds every provisioned store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Bundled template store.
    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Path of the store for `id`.
    pub fn store_path(&self, id: ResourceId) -> PathBuf {
        self.base_dir.join(Self::store_name(id))
    }

    /// Config for `id`.
    pub fn config_for(&self, id: ResourceId) -> ResourceConfig {
        ResourceConfig {
            id,
            template_id: ResourceId::TEMPLATE,
            storage_path: self.store_path(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_path_is_deterministic() {
        let layout = ResourceLayout::new("/data/databases", "/bundle/save_0.db");
        let config = layout.config_for(ResourceId::new(4));
        assert_eq!(config.storage_path, PathBuf::from("/data/databases/save_4.db"));
        assert_eq!(config.template_id, ResourceId::TEMPLATE);
        assert_eq!(layout.config_for(ResourceId::new(4)), config);
    }

    #[test]
    fn test_template_id_store_name() {
        assert_eq!(ResourceLayout::store_name(ResourceId::TEMPLATE), "save_0.db");
    }
}
