//! Surface registry - at most one live handle per surface id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use deskshell_core::{MenuItem, SurfaceCatalog, SurfaceConfig, SurfaceId, TaskResponse};

use crate::error::{HostError, RuntimeError};

/// Message delivered to a live surface.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum SurfaceMessage {
    /// Arbitrary data sent by another surface.
    Data(Value),
    /// Report for a task dispatched on behalf of the surface.
    Task(TaskResponse),
}

/// The UI layer that actually presents surfaces.
///
/// Implementations render content, own the shared application menu, and
/// call [`SurfaceHandle::mark_closed`] when the user closes a surface.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    /// Present a newly created surface.
    async fn open(&self, handle: Arc<SurfaceHandle>) -> Result<(), HostError>;

    /// Tear down a surface closed by the orchestrator.
    async fn close(&self, handle: &SurfaceHandle);

    /// Deliver a message to a live surface.
    async fn deliver(&self, handle: &SurfaceHandle, message: SurfaceMessage);

    /// Append an entry to the shared application menu.
    async fn append_menu_item(&self, item: &MenuItem);
}

/// Notified once for every surface instance that closes, whoever closed it.
#[async_trait]
pub trait ClosureListener: Send + Sync {
    /// Called while the registry is locked, before `id` can be recreated.
    async fn surface_closed(&self, id: &SurfaceId);
}

/// A live surface created by the [`SurfaceRegistry`].
#[derive(Debug)]
pub struct SurfaceHandle {
    config: SurfaceConfig,
    instance: u64,
    opened_at: DateTime<Utc>,
    closed: CancellationToken,
}

impl SurfaceHandle {
    // Only the registry creates handles.
    fn new(config: SurfaceConfig, instance: u64) -> Self {
        Self {
            config,
            instance,
            opened_at: Utc::now(),
            closed: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &SurfaceId {
        &self.config.id
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Process-unique creation number; differs between recreations of one id.
    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Mark the surface as closed. The registry drops its entry so the next
    /// `get` creates a fresh handle.
    pub fn mark_closed(&self) {
        self.closed.cancel();
    }

    /// Resolves once the surface has been closed.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }
}

#[derive(Default)]
struct RegistryState {
    live: HashMap<SurfaceId, Arc<SurfaceHandle>>,
    menu_initialized: bool,
}

/// Keyed cache of live surfaces with lazy, catalog-driven creation.
#[derive(Clone)]
pub struct SurfaceRegistry {
    catalog: Arc<SurfaceCatalog>,
    host: Arc<dyn SurfaceHost>,
    state: Arc<Mutex<RegistryState>>,
    next_instance: Arc<AtomicU64>,
    listeners: Vec<Arc<dyn ClosureListener>>,
}

impl SurfaceRegistry {
    /// Create an empty registry over `catalog`.
    pub fn new(catalog: SurfaceCatalog, host: Arc<dyn SurfaceHost>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            host,
            state: Arc::new(Mutex::new(RegistryState::default())),
            next_instance: Arc::new(AtomicU64::new(1)),
            listeners: Vec::new(),
        }
    }

    /// Builder method to register a [`ClosureListener`].
    pub fn with_closure_listener(mut self, listener: Arc<dyn ClosureListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn catalog(&self) -> &SurfaceCatalog {
        &self.catalog
    }

    /// Return the live handle for `id`, creating it from its config if needed.
    pub async fn get(&self, id: &SurfaceId) -> Result<Arc<SurfaceHandle>, RuntimeError> {
        let mut state = self.state.lock().await;

        if let Some(handle) = state.live.get(id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
            // Closed, but the closure watcher has not run yet.
            state.live.remove(id);
            notify_closed(&self.listeners, id).await;
        }

        let config = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::ConfigNotFound(id.clone()))?;

        let instance = self.next_instance.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(SurfaceHandle::new(config, instance));
        self.host.open(handle.clone()).await?;
        state.live.insert(id.clone(), handle.clone());

        // Only once a surface actually exists.
        if !state.menu_initialized {
            state.menu_initialized = true;
            for item in self.catalog.first_surface_menu() {
                self.host.append_menu_item(item).await;
                debug!(label = %item.label, opens = %item.opens, "Menu entry added");
            }
        }
        drop(state);

        self.watch_closure(handle.clone());
        info!(surface = %id, instance, "Surface created");
        Ok(handle)
    }

    /// Close `id` if it is live. Returns false if there was nothing to close.
    pub async fn close(&self, id: &SurfaceId) -> bool {
        let handle = {
            let mut state = self.state.lock().await;
            let Some(handle) = state.live.remove(id) else {
                debug!(surface = %id, "Close skipped - surface not live");
                return false;
            };
            handle.mark_closed();
            notify_closed(&self.listeners, id).await;
            handle
        };
        self.host.close(&handle).await;
        info!(surface = %id, instance = handle.instance(), "Surface closed");
        true
    }

    /// Deliver `message` to `handle` unless it has been closed.
    pub async fn deliver(&self, handle: &SurfaceHandle, message: SurfaceMessage) -> bool {
        if handle.is_closed() {
            return false;
        }
        self.host.deliver(handle, message).await;
        true
    }

    /// Check if `id` has a live handle.
    pub async fn is_live(&self, id: &SurfaceId) -> bool {
        self.state
            .lock()
            .await
            .live
            .get(id)
            .is_some_and(|handle| !handle.is_closed())
    }

    /// Ids of live surfaces, sorted.
    pub async fn live_ids(&self) -> Vec<SurfaceId> {
        let state = self.state.lock().await;
        let mut ids: Vec<_> = state
            .live
            .values()
            .filter(|handle| !handle.is_closed())
            .map(|handle| handle.id().clone())
            .collect();
        ids.sort();
        ids
    }

    pub async fn live_count(&self) -> usize {
        self.live_ids().await.len()
    }

    /// Drop the entry for `handle` once the host reports it closed.
    fn watch_closure(&self, handle: Arc<SurfaceHandle>) {
        let state: Weak<Mutex<RegistryState>> = Arc::downgrade(&self.state);
        let listeners = self.listeners.clone();
        tokio::spawn(async move {
            handle.closed().await;
            let Some(state) = state.upgrade() else {
                return;
            };
            let mut state = state.lock().await;
            let same_instance = state
                .live
                .get(handle.id())
                .is_some_and(|live| live.instance() == handle.instance());
            if same_instance {
                state.live.remove(handle.id());
                notify_closed(&listeners, handle.id()).await;
                info!(
                    surface = %handle.id(),
                    instance = handle.instance(),
                    "Surface closed by host"
                );
            }
        });
    }
}

async fn notify_closed(listeners: &[Arc<dyn ClosureListener>], id: &SurfaceId) {
    for listener in listeners {
        listener.surface_closed(id).await;
    }
}
