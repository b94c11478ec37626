//! Worker dispatcher - routes task requests to isolated execution contexts.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use deskshell_core::{
    DispatchId, SurfaceId, TaskLifecycle, TaskRequest, TaskResponse, TaskTarget,
};

use crate::config::DispatcherConfig;
use crate::executor::TaskExecutor;

/// A request routes at most `Running` plus one terminal report.
const MIN_CHANNEL_CAPACITY: usize = 2;

type ObserverMap = HashMap<SurfaceId, Vec<mpsc::UnboundedSender<TaskResponse>>>;

/// Handle for one dispatched request.
#[derive(Debug)]
pub struct Dispatch {
    /// Identifier used in logs for this request.
    pub id: DispatchId,

    /// Every report for this request, in protocol order.
    pub responses: ReceiverStream<TaskResponse>,
}

/// Routes task requests to worker contexts and fans their reports out to
/// the observers of the originating surface.
#[derive(Clone)]
pub struct WorkerDispatcher {
    executor: TaskExecutor,
    channel_capacity: usize,
    observers: Arc<RwLock<ObserverMap>>,
}

impl WorkerDispatcher {
    /// Create a new WorkerDispatcher.
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            executor: TaskExecutor::new(config.listing_root),
            channel_capacity: config.channel_capacity.max(MIN_CHANNEL_CAPACITY),
            observers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an observer for every report dispatched on behalf of `surface`.
    pub async fn subscribe(&self, surface: &SurfaceId) -> mpsc::UnboundedReceiver<TaskResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers
            .write()
            .await
            .entry(surface.clone())
            .or_default()
            .push(tx);
        rx
    }

    /// Drop every observer of `surface`. In-flight work keeps running; its
    /// reports are simply no longer delivered there.
    pub async fn unsubscribe_all(&self, surface: &SurfaceId) -> usize {
        let removed = self
            .observers
            .write()
            .await
            .remove(surface)
            .map(|observers| observers.len())
            .unwrap_or(0);
        if removed > 0 {
            debug!(surface = %surface, removed, "Observers dropped");
        }
        removed
    }

    /// Number of live observers for `surface`.
    pub async fn observer_count(&self, surface: &SurfaceId) -> usize {
        self.observers
            .read()
            .await
            .get(surface)
            .map(|observers| observers.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Dispatch `request` on behalf of `surface`.
    ///
    /// Must be called from within a tokio runtime. Never fails: an
    /// unrecognized target is answered with a single `Failed` report.
    pub fn dispatch(&self, surface: SurfaceId, request: TaskRequest) -> Dispatch {
        let id = DispatchId::generate();
        let (worker_tx, worker_rx) = mpsc::channel(self.channel_capacity);
        let (caller_tx, caller_rx) = mpsc::channel(self.channel_capacity);

        info!(
            dispatch_id = %id,
            surface = %surface,
            target = %request.target,
            "Dispatching task"
        );

        let target = request.target.clone();
        let executor = self.executor.clone();
        let worker_id = id.clone();
        tokio::spawn(async move {
            run_worker(executor, worker_id, request, worker_tx).await;
        });

        let relay = Relay {
            id: id.clone(),
            surface,
            target,
            observers: self.observers.clone(),
        };
        tokio::spawn(async move {
            relay.run(worker_rx, caller_tx).await;
        });

        Dispatch {
            id,
            responses: ReceiverStream::new(caller_rx),
        }
    }
}

/// Body of one worker execution context.
async fn run_worker(
    executor: TaskExecutor,
    id: DispatchId,
    request: TaskRequest,
    tx: mpsc::Sender<TaskResponse>,
) {
    let Some(kind) = request.target.kind() else {
        warn!(dispatch_id = %id, target = %request.target, "Unknown task kind");
        let failed = TaskResponse::failed(request.target.clone(), request.payload.clone(), None);
        send_report(&tx, &id, failed).await;
        return;
    };

    // Observers must see Running before any work starts.
    send_report(&tx, &id, TaskResponse::running(&request)).await;

    let response = match executor.execute(kind, &request.payload).await {
        Ok(execution) => {
            info!(
                dispatch_id = %id,
                target = %kind,
                elapsed_ms = execution.elapsed.as_secs_f64() * 1000.0,
                "Task completed"
            );
            TaskResponse::completed(request.target, execution.result, execution.elapsed)
        }
        Err(e) => {
            warn!(dispatch_id = %id, target = %kind, error = %e, "Task failed");
            TaskResponse::failed(request.target, json!({ "error": e.to_string() }), None)
        }
    };
    send_report(&tx, &id, response).await;
}

async fn send_report(tx: &mpsc::Sender<TaskResponse>, id: &DispatchId, response: TaskResponse) {
    if tx.send(response).await.is_err() {
        warn!(dispatch_id = %id, "Failed to send task report - relay dropped");
    }
}

/// Consumes one worker's channel and republishes it.
struct Relay {
    id: DispatchId,
    surface: SurfaceId,
    target: TaskTarget,
    observers: Arc<RwLock<ObserverMap>>,
}

impl Relay {
    async fn run(
        self,
        mut worker_rx: mpsc::Receiver<TaskResponse>,
        caller_tx: mpsc::Sender<TaskResponse>,
    ) {
        let mut lifecycle = TaskLifecycle::new();

        while let Some(response) = worker_rx.recv().await {
            if let Err(e) = lifecycle.advance(response.status) {
                warn!(dispatch_id = %self.id, error = %e, "Dropping out-of-order task report");
                continue;
            }
            self.forward(response, &caller_tx).await;
            if lifecycle.is_terminal() {
                return;
            }
        }

        // The worker context went away without a terminal report.
        warn!(
            dispatch_id = %self.id,
            status = %lifecycle.status(),
            "Worker context ended early"
        );
        let failed = TaskResponse::failed(
            self.target.clone(),
            json!({ "error": "worker context ended without a result" }),
            None,
        );
        self.forward(failed, &caller_tx).await;
    }

    async fn forward(&self, response: TaskResponse, caller_tx: &mpsc::Sender<TaskResponse>) {
        {
            let mut observers = self.observers.write().await;
            if let Some(list) = observers.get_mut(&self.surface) {
                list.retain(|tx| tx.send(response.clone()).is_ok());
                if list.is_empty() {
                    observers.remove(&self.surface);
                }
            }
        }

        if caller_tx.send(response).await.is_err() {
            debug!(dispatch_id = %self.id, "Response stream dropped by caller");
        }
    }
}
