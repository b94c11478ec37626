//! Resource pool - exactly one active backing store at a time.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use deskshell_core::{ResourceConfig, ResourceId, ResourceLayout};

use crate::error::PoolError;

/// Opens and closes handles to a provisioned backing store.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Handle type kept by the pool while active.
    type Handle: Send + Sync + 'static;

    /// Open a handle to the store described by `config`. The store file is
    /// guaranteed to exist when this is called.
    async fn connect(&self, config: &ResourceConfig) -> Result<Self::Handle, PoolError>;

    /// Close `handle`. Only called for an explicit release.
    async fn disconnect(&self, handle: &Self::Handle);
}

struct PoolEntry<H> {
    id: ResourceId,
    handle: Arc<H>,
}

struct PoolState<H> {
    active: Option<PoolEntry<H>>,
    /// Last acquired id; the target of argument-less acquisitions.
    current: ResourceId,
}

/// Keyed cache holding at most one active handle.
///
/// Acquiring a different id replaces the active entry. The displaced handle
/// is dereferenced, not disconnected: holders of its `Arc` keep a working
/// handle until they drop it.
pub struct ResourcePool<C: Connector> {
    connector: C,
    layout: ResourceLayout,
    state: Mutex<PoolState<C::Handle>>,
}

impl<C: Connector> ResourcePool<C> {
    /// Create an empty pool.
    pub fn new(connector: C, layout: ResourceLayout) -> Self {
        Self {
            connector,
            layout,
            state: Mutex::new(PoolState {
                active: None,
                current: ResourceId::TEMPLATE,
            }),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn layout(&self) -> &ResourceLayout {
        &self.layout
    }

    /// Return the handle for `id`, provisioning and opening it if needed.
    pub async fn acquire(&self, id: ResourceId) -> Result<Arc<C::Handle>, PoolError> {
        let mut state = self.state.lock().await;
        self.acquire_locked(&mut state, id).await
    }

    /// Acquire the last acquired id (the template id before any acquisition).
    pub async fn acquire_current(&self) -> Result<Arc<C::Handle>, PoolError> {
        let mut state = self.state.lock().await;
        let id = state.current;
        self.acquire_locked(&mut state, id).await
    }

    async fn acquire_locked(
        &self,
        state: &mut PoolState<C::Handle>,
        id: ResourceId,
    ) -> Result<Arc<C::Handle>, PoolError> {
        if let Some(entry) = state.active.as_ref().filter(|entry| entry.id == id) {
            debug!(resource = %id, "Resource already active");
            return Ok(entry.handle.clone());
        }

        // Provision and open before touching the active entry, so a failure
        // leaves the previous resource in place.
        let config = self.layout.config_for(id);
        if provision(&config, self.layout.template_path()).await? {
            info!(
                resource = %id,
                path = %config.storage_path.display(),
                "Provisioned store from template"
            );
        }
        let handle = Arc::new(self.connector.connect(&config).await?);

        let previous = state.active.replace(PoolEntry {
            id,
            handle: handle.clone(),
        });
        state.current = id;

        match previous {
            Some(previous) => info!(
                resource = %id,
                evicted = %previous.id,
                "Switched active resource"
            ),
            None => info!(resource = %id, "Activated resource"),
        }

        Ok(handle)
    }

    /// Last acquired id.
    pub async fn current_id(&self) -> ResourceId {
        self.state.lock().await.current
    }

    /// Id of the active handle, if any.
    pub async fn active_id(&self) -> Option<ResourceId> {
        self.state.lock().await.active.as_ref().map(|entry| entry.id)
    }

    /// Disconnect whichever handle is active. Returns its id, or `None` if
    /// nothing was active.
    pub async fn release_current(&self) -> Option<ResourceId> {
        let mut state = self.state.lock().await;
        let entry = state.active.take()?;
        self.connector.disconnect(&entry.handle).await;
        info!(resource = %entry.id, "Released resource");
        Some(entry.id)
    }

    /// Disconnect `id` only if it is still the active handle.
    pub async fn release(&self, id: ResourceId) -> bool {
        let mut state = self.state.lock().await;
        match state.active.as_ref() {
            Some(entry) if entry.id == id => {}
            _ => {
                debug!(resource = %id, "Release skipped - resource not active");
                return false;
            }
        }
        if let Some(entry) = state.active.take() {
            self.connector.disconnect(&entry.handle).await;
            info!(resource = %entry.id, "Released resource");
        }
        true
    }
}

/// Ensure the store for `config` exists, copying `template` into place the
/// first time. Returns true if a copy was made.
pub async fn provision(config: &ResourceConfig, template: &Path) -> Result<bool, PoolError> {
    let target = config.storage_path.as_path();
    let at_target = |source| PoolError::Provisioning {
        path: target.to_path_buf(),
        source,
    };

    if tokio::fs::try_exists(target).await.map_err(at_target)? {
        return Ok(false);
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(at_target)?;
    }

    // Copy beside the target and rename, so a partial copy is never reused.
    let partial = target.with_extension("db.partial");
    if let Err(source) = tokio::fs::copy(template, &partial).await {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %partial.display(), error = %e, "Failed to remove partial store");
            }
        }
        return Err(PoolError::Provisioning {
            path: template.to_path_buf(),
            source,
        });
    }
    tokio::fs::rename(&partial, target).await.map_err(at_target)?;

    Ok(true)
}
