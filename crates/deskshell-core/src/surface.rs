//! Surface configuration and the startup catalog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::SurfaceId;

/// Display and behavior options for a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOptions {
    pub width: u32,
    pub height: u32,

    /// Fixed position, or `None` to let the host place the surface.
    pub x: Option<i32>,
    pub y: Option<i32>,

    /// Draw the surface without a native frame.
    pub frame: bool,
    pub resizable: bool,
    pub movable: bool,
    pub minimizable: bool,
    pub maximizable: bool,

    /// Background color shown before content loads.
    pub background_color: Option<String>,

    /// Allow content to start background workers directly.
    pub worker_integration: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            x: None,
            y: None,
            frame: true,
            resizable: true,
            movable: true,
            minimizable: true,
            maximizable: true,
            background_color: Some("whitesmoke".to_string()),
            worker_integration: false,
        }
    }
}

impl SurfaceOptions {
    /// Builder method to set the size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Builder method to pin the position.
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Frameless, fixed surface (splash screens).
    pub fn frameless(mut self) -> Self {
        self.frame = false;
        self.resizable = false;
        self.movable = false;
        self.minimizable = false;
        self.maximizable = false;
        self
    }

    /// Builder method to enable worker integration.
    pub fn with_worker_integration(mut self) -> Self {
        self.worker_integration = true;
        self
    }
}

/// Immutable description of a surface, registered once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Unique surface identifier.
    pub id: SurfaceId,

    /// What content the surface loads.
    pub source: String,

    /// Display/behavior configuration.
    pub options: SurfaceOptions,
}

impl SurfaceConfig {
    /// Create a new SurfaceConfig with default options.
    pub fn new(id: impl Into<SurfaceId>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            options: SurfaceOptions::default(),
        }
    }

    /// Builder method to set options.
    pub fn with_options(mut self, options: SurfaceOptions) -> Self {
        self.options = options;
        self
    }
}

/// Entry appended to the host's shared application menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Visible label.
    pub label: String,

    /// Surface opened when the entry is activated.
    pub opens: SurfaceId,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, opens: impl Into<SurfaceId>) -> Self {
        Self {
            label: label.into(),
            opens: opens.into(),
        }
    }
}

/// Every surface the process knows about, plus the menu entries added when
/// the first surface is created.
#[derive(Debug, Clone, Default)]
pub struct SurfaceCatalog {
    configs: HashMap<SurfaceId, SurfaceConfig>,
    first_surface_menu: Vec<MenuItem>,
}

impl SurfaceCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in `main`, `splash` and `threading` surfaces.
    pub fn builtin() -> Self {
        Self::new()
            .with_surface(
                SurfaceConfig::new(SurfaceId::MAIN, "app://main/index.html")
                    .with_options(SurfaceOptions::default().with_size(800, 600)),
            )
            .with_surface(
                SurfaceConfig::new(SurfaceId::SPLASH, "app://splash/index.html")
                    .with_options(SurfaceOptions::default().frameless().with_size(300, 400)),
            )
            .with_surface(
                SurfaceConfig::new(SurfaceId::THREADING, "app://threading/index.html")
                    .with_options(SurfaceOptions {
                        background_color: None,
                        ..SurfaceOptions::default()
                            .with_size(512, 384)
                            .with_position(0, 0)
                            .with_worker_integration()
                    }),
            )
            .with_menu_item(MenuItem::new("Threading", SurfaceId::THREADING))
    }

    /// Builder method to register a surface. A later registration for the
    /// same id replaces the earlier one.
    pub fn with_surface(mut self, config: SurfaceConfig) -> Self {
        self.configs.insert(config.id.clone(), config);
        self
    }

    /// Builder method to add a first-surface menu entry.
    pub fn with_menu_item(mut self, item: MenuItem) -> Self {
        self.first_surface_menu.push(item);
        self
    }

    /// Look up a registered config.
    pub fn get(&self, id: &SurfaceId) -> Option<&SurfaceConfig> {
        self.configs.get(id)
    }

    /// Check if an id is registered.
    pub fn contains(&self, id: &SurfaceId) -> bool {
        self.configs.contains_key(id)
    }

    /// Menu entries appended once, when the first surface is created.
    pub fn first_surface_menu(&self) -> &[MenuItem] {
        &self.first_surface_menu
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&SurfaceId> {
        let mut ids: Vec<_> = self.configs.keys().collect();
        ids.sort();
        ids
    }
}
