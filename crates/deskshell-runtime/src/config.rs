//! Application configuration.

use std::path::PathBuf;

use deskshell_core::{ResourceLayout, SurfaceId};
use deskshell_worker::DispatcherConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name reported by `app.info`.
    pub app_name: String,

    /// Version reported by `app.info`.
    pub version: String,

    /// Directory holding provisioned stores.
    pub data_dir: PathBuf,

    /// Bundled template store, copied for first-time resource ids.
    pub template_path: PathBuf,

    /// Directory listed by the `listing` task.
    pub listing_root: PathBuf,

    /// Capacity of each per-dispatch response channel.
    pub channel_capacity: usize,

    /// Surface opened on launch.
    pub startup_surface: SurfaceId,

    /// Stop the trigger loop once the last surface closes.
    pub quit_when_all_closed: bool,

    /// SQLite connections per store.
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "deskshell".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: default_data_dir(),
            template_path: PathBuf::from("resources/databases/save_0.db"),
            listing_root: PathBuf::from("."),
            channel_capacity: 16,
            startup_surface: SurfaceId::from(SurfaceId::SPLASH),
            quit_when_all_closed: true,
            max_connections: 1,
        }
    }
}

impl AppConfig {
    /// Store layout rooted at `data_dir`.
    pub fn layout(&self) -> ResourceLayout {
        ResourceLayout::new(self.data_dir.clone(), self.template_path.clone())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            channel_capacity: self.channel_capacity,
            listing_root: self.listing_root.clone(),
        }
    }
}

/// Per-user data directory for stores, or `./databases` if the platform
/// has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("deskshell").join("databases"))
        .unwrap_or_else(|| PathBuf::from("databases"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskshell_core::ResourceId;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.app_name, "deskshell");
        assert_eq!(config.startup_surface.as_str(), "splash");
        assert_eq!(config.channel_capacity, 16);
        assert!(config.quit_when_all_closed);
        assert!(config.data_dir.ends_with("databases"));
    }

    #[test]
    fn test_layout_uses_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/deskshell"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.layout().store_path(ResourceId::new(2)),
            PathBuf::from("/tmp/deskshell/save_2.db")
        );
        assert_eq!(
            config.layout().template_path(),
            std::path::Path::new("resources/databases/save_0.db")
        );
    }

    #[test]
    fn test_dispatcher_config_carries_listing_root() {
        let config = AppConfig {
            listing_root: PathBuf::from("/srv"),
            channel_capacity: 4,
            ..AppConfig::default()
        };
        let dispatcher = config.dispatcher_config();
        assert_eq!(dispatcher.listing_root, PathBuf::from("/srv"));
        assert_eq!(dispatcher.channel_capacity, 4);
    }
}
