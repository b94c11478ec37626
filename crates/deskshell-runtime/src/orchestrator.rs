//! Trigger routing between surfaces, the resource pool, and workers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use deskshell_core::{DispatchId, SurfaceCatalog, SurfaceId, TaskResponse};
use deskshell_worker::{Dispatch, WorkerDispatcher};

use crate::config::AppConfig;
use crate::error::RuntimeError;
use crate::pool::{Connector, ResourcePool};
use crate::surface::{
    ClosureListener, SurfaceHandle, SurfaceHost, SurfaceMessage, SurfaceRegistry,
};
use crate::trigger::{Outcome, Trigger};

/// Routes each [`Trigger`] to the component that owns it.
///
/// Holds no state of its own beyond the components it routes to and the
/// report pumps of in-flight dispatches.
pub struct Orchestrator<C: Connector> {
    surfaces: SurfaceRegistry,
    pool: ResourcePool<C>,
    dispatcher: WorkerDispatcher,
    pumps: Mutex<JoinSet<Option<TaskResponse>>>,
    startup_surface: SurfaceId,
    app_name: String,
    version: String,
}

impl<C: Connector> Orchestrator<C> {
    /// Wire the components described by `config`.
    pub fn new(
        config: &AppConfig,
        catalog: SurfaceCatalog,
        host: Arc<dyn SurfaceHost>,
        connector: C,
    ) -> Self {
        let dispatcher = WorkerDispatcher::new(config.dispatcher_config());
        let surfaces = SurfaceRegistry::new(catalog, host)
            .with_closure_listener(Arc::new(dispatcher.clone()));
        Self {
            surfaces,
            pool: ResourcePool::new(connector, config.layout()),
            dispatcher,
            pumps: Mutex::new(JoinSet::new()),
            startup_surface: config.startup_surface.clone(),
            app_name: config.app_name.clone(),
            version: config.version.clone(),
        }
    }

    pub fn surfaces(&self) -> &SurfaceRegistry {
        &self.surfaces
    }

    pub fn pool(&self) -> &ResourcePool<C> {
        &self.pool
    }

    pub fn dispatcher(&self) -> &WorkerDispatcher {
        &self.dispatcher
    }

    /// Open the startup surface.
    pub async fn start(&self) -> Result<Arc<SurfaceHandle>, RuntimeError> {
        info!(
            app = %self.app_name,
            version = %self.version,
            surface = %self.startup_surface,
            "Starting application"
        );
        self.surfaces.get(&self.startup_surface).await
    }

    /// Release the active resource before exit.
    pub async fn shutdown(&self) {
        if let Some(id) = self.pool.release_current().await {
            info!(resource = %id, "Released resource on shutdown");
        }
        info!("Application stopped");
    }

    /// Wait until every outstanding dispatch has produced its terminal
    /// report, returning the last report of each.
    pub async fn drain(&self) -> Vec<TaskResponse> {
        let mut pumps = self.pumps.lock().await;
        let mut finished = Vec::new();
        while let Some(result) = pumps.join_next().await {
            match result {
                Ok(Some(response)) => finished.push(response),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Report pump ended abnormally"),
            }
        }
        if !finished.is_empty() {
            debug!(count = finished.len(), "Drained dispatches");
        }
        finished
    }

    /// True once no surface is live.
    pub async fn all_closed(&self) -> bool {
        self.surfaces.live_count().await == 0
    }

    /// Handle one trigger.
    pub async fn handle(&self, trigger: Trigger) -> Result<Outcome, RuntimeError> {
        debug!(route = trigger.route(), "Handling trigger");

        match trigger {
            Trigger::OpenSurface { id } => {
                let handle = self.surfaces.get(&id).await?;
                Ok(surface_outcome(&handle))
            }
            Trigger::CloseSurface { id } => {
                let was_live = self.surfaces.close(&id).await;
                let remaining = self.surfaces.live_count().await;
                if remaining == 0 {
                    info!("All surfaces closed");
                }
                Ok(Outcome::Closed {
                    id,
                    was_live,
                    remaining,
                })
            }
            Trigger::SendToSurface { id, payload } => {
                let handle = self.surfaces.get(&id).await?;
                self.surfaces
                    .deliver(&handle, SurfaceMessage::Data(payload))
                    .await;
                Ok(Outcome::Delivered { id })
            }
            Trigger::AcquireResource { id } => {
                let id = match id {
                    Some(id) => {
                        self.pool.acquire(id).await?;
                        id
                    }
                    None => {
                        self.pool.acquire_current().await?;
                        self.pool.current_id().await
                    }
                };
                Ok(Outcome::Resource { id })
            }
            Trigger::ReleaseCurrentResource => Ok(Outcome::Released {
                id: self.pool.release_current().await,
            }),
            Trigger::DispatchTask { surface, request } => {
                let handle = self.surfaces.get(&surface).await?;
                let Dispatch { id, responses } = self.dispatcher.dispatch(surface.clone(), request);
                self.pump(handle, id.clone(), responses).await;
                Ok(Outcome::Dispatched {
                    dispatch_id: id,
                    surface,
                })
            }
            Trigger::AppInfo => Ok(Outcome::AppInfo {
                name: self.app_name.clone(),
                version: self.version.clone(),
            }),
            Trigger::Activate => {
                if !self.all_closed().await {
                    return Ok(Outcome::Activated { opened: None });
                }
                let main = SurfaceId::from(SurfaceId::MAIN);
                self.surfaces.get(&main).await?;
                Ok(Outcome::Activated { opened: Some(main) })
            }
        }
    }

    /// Forward a dispatch's reports to its surface while it is live. Reports
    /// are consumed to the end either way.
    async fn pump(
        &self,
        handle: Arc<SurfaceHandle>,
        id: DispatchId,
        mut responses: ReceiverStream<TaskResponse>,
    ) {
        let surfaces = self.surfaces.clone();
        let mut pumps = self.pumps.lock().await;
        while pumps.try_join_next().is_some() {}

        pumps.spawn(async move {
            let mut delivering = true;
            let mut last = None;
            while let Some(response) = responses.next().await {
                if delivering
                    && !surfaces
                        .deliver(&handle, SurfaceMessage::Task(response.clone()))
                        .await
                {
                    delivering = false;
                    debug!(
                        dispatch_id = %id,
                        surface = %handle.id(),
                        "Surface closed - no longer delivering reports"
                    );
                }
                last = Some(response);
            }
            last
        });
    }
}

#[async_trait]
impl ClosureListener for WorkerDispatcher {
    async fn surface_closed(&self, id: &SurfaceId) {
        self.unsubscribe_all(id).await;
    }
}

fn surface_outcome(handle: &SurfaceHandle) -> Outcome {
    Outcome::Surface {
        id: handle.id().clone(),
        instance: handle.instance(),
        opened_at: handle.opened_at(),
    }
}
