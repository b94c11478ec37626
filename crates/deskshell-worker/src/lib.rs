//! deskshell background workers.
//!
//! Task requests are dispatched to isolated execution contexts. Each context
//! runs exactly one task kind and reports its progress through the
//! `Running -> {Completed, Failed}` protocol over a per-request channel; the
//! dispatcher republishes every report to the observers of the originating
//! surface.

pub mod board;
pub mod config;
pub mod dispatcher;
pub mod executor;

pub use board::{TaskBoard, TaskRow};
pub use config::DispatcherConfig;
pub use dispatcher::{Dispatch, WorkerDispatcher};
pub use executor::{Execution, ExecutorError, TaskExecutor};
