//! Headless surface host.
//!
//! Presents nothing on screen. Surfaces are tracked in memory, menu entries
//! are recorded, and deliveries are forwarded over a channel so the binary
//! can print them. Task reports also update a per-surface [`TaskBoard`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use deskshell_core::{MenuItem, SurfaceId};
use deskshell_worker::{TaskBoard, TaskRow};

use crate::error::HostError;
use crate::surface::{SurfaceHandle, SurfaceHost, SurfaceMessage};

/// A message delivered to a surface.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub surface: SurfaceId,
    pub message: SurfaceMessage,

    /// The surface's task board after applying a task report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<TaskRow>>,
}

/// [`SurfaceHost`] without a display.
pub struct HeadlessHost {
    surfaces: Mutex<HashMap<SurfaceId, Arc<SurfaceHandle>>>,
    menu: Mutex<Vec<MenuItem>>,
    boards: Mutex<HashMap<SurfaceId, TaskBoard>>,
    deliveries: mpsc::UnboundedSender<Delivery>,
}

impl HeadlessHost {
    /// Create a host and the receiving end of its deliveries.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Self {
            surfaces: Mutex::new(HashMap::new()),
            menu: Mutex::new(Vec::new()),
            boards: Mutex::new(HashMap::new()),
            deliveries: tx,
        };
        (host, rx)
    }

    /// Menu entries appended so far.
    pub fn menu(&self) -> Vec<MenuItem> {
        match self.menu.lock() {
            Ok(menu) => menu.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Ids of surfaces currently presented.
    pub fn presented(&self) -> Vec<SurfaceId> {
        let surfaces = match self.surfaces.lock() {
            Ok(surfaces) => surfaces,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut ids: Vec<_> = surfaces.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Rows of the task board for `id`, sorted by target.
    pub fn board_rows(&self, id: &SurfaceId) -> Vec<TaskRow> {
        let boards = match self.boards.lock() {
            Ok(boards) => boards,
            Err(poisoned) => poisoned.into_inner(),
        };
        boards.get(id).map(TaskBoard::rows).unwrap_or_default()
    }

    fn reset_board(&self, id: &SurfaceId) {
        match self.boards.lock() {
            Ok(mut boards) => boards.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        };
    }

    /// Close `id` as if the user dismissed it.
    pub fn user_close(&self, id: &SurfaceId) -> bool {
        let handle = match self.surfaces.lock() {
            Ok(mut surfaces) => surfaces.remove(id),
            Err(poisoned) => poisoned.into_inner().remove(id),
        };
        match handle {
            Some(handle) => {
                info!(surface = %id, "Surface dismissed by user");
                self.reset_board(id);
                handle.mark_closed();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SurfaceHost for HeadlessHost {
    async fn open(&self, handle: Arc<SurfaceHandle>) -> Result<(), HostError> {
        let options = &handle.config().options;
        info!(
            surface = %handle.id(),
            source = %handle.config().source,
            width = options.width,
            height = options.height,
            "Presenting surface"
        );
        // A new instance starts with an empty board.
        self.reset_board(handle.id());
        let mut surfaces = self
            .surfaces
            .lock()
            .map_err(|_| HostError("surface table poisoned".to_string()))?;
        surfaces.insert(handle.id().clone(), handle);
        Ok(())
    }

    async fn close(&self, handle: &SurfaceHandle) {
        let mut surfaces = match self.surfaces.lock() {
            Ok(surfaces) => surfaces,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Only drop our entry if it is still this instance.
        if surfaces
            .get(handle.id())
            .is_some_and(|live| live.instance() == handle.instance())
        {
            surfaces.remove(handle.id());
            drop(surfaces);
            self.reset_board(handle.id());
        }
        debug!(surface = %handle.id(), "Surface torn down");
    }

    async fn deliver(&self, handle: &SurfaceHandle, message: SurfaceMessage) {
        let board = match &message {
            SurfaceMessage::Task(response) => {
                let mut boards = match self.boards.lock() {
                    Ok(boards) => boards,
                    Err(poisoned) => poisoned.into_inner(),
                };
                let board = boards.entry(handle.id().clone()).or_default();
                board.apply(response.clone());
                Some(board.rows())
            }
            SurfaceMessage::Data(_) => None,
        };
        let delivery = Delivery {
            surface: handle.id().clone(),
            message,
            board,
        };
        if self.deliveries.send(delivery).is_err() {
            warn!(surface = %handle.id(), "Delivery dropped - no receiver");
        }
    }

    async fn append_menu_item(&self, item: &MenuItem) {
        match self.menu.lock() {
            Ok(mut menu) => menu.push(item.clone()),
            Err(poisoned) => poisoned.into_inner().push(item.clone()),
        }
    }
}
