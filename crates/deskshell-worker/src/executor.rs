//! Task bodies run inside worker execution contexts.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use deskshell_core::TaskKind;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while running a unit of work.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: TaskKind, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker context aborted: {0}")]
    Aborted(String),
}

/// Result of a successful unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Result payload reported with `Completed`.
    pub result: Value,
    /// Time spent in the unit of work only.
    pub elapsed: Duration,
}

/// Runs the body of each known task kind.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    listing_root: PathBuf,
}

impl TaskExecutor {
    /// Create a new executor listing `listing_root` for `listing` tasks.
    pub fn new(listing_root: impl Into<PathBuf>) -> Self {
        Self {
            listing_root: listing_root.into(),
        }
    }

    /// Run one unit of work of `kind` with `payload`.
    pub async fn execute(&self, kind: TaskKind, payload: &Value) -> Result<Execution, ExecutorError> {
        match kind {
            TaskKind::Fibonacci => self.fibonacci(payload).await,
            TaskKind::Listing => self.listing().await,
        }
    }

    /// CPU-bound, so it runs on the blocking pool rather than a runtime worker.
    async fn fibonacci(&self, payload: &Value) -> Result<Execution, ExecutorError> {
        let num = payload
            .get("num")
            .and_then(Value::as_u64)
            .ok_or_else(|| ExecutorError::InvalidPayload {
                kind: TaskKind::Fibonacci,
                reason: "expected a non-negative integer `num`".to_string(),
            })?;

        let (value, elapsed) = tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let value = fibonacci(num);
            (value, start.elapsed())
        })
        .await
        .map_err(|e| ExecutorError::Aborted(e.to_string()))?;

        debug!(num, elapsed_ms = elapsed.as_millis() as u64, "Fibonacci computed");

        Ok(Execution {
            result: json!({ "num": num, "result": value }),
            elapsed,
        })
    }

    async fn listing(&self) -> Result<Execution, ExecutorError> {
        let start = Instant::now();
        let mut entries = tokio::fs::read_dir(&self.listing_root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        let elapsed = start.elapsed();
        names.sort();

        debug!(root = %self.listing_root.display(), count = names.len(), "Directory listed");

        Ok(Execution {
            result: json!(names),
            elapsed,
        })
    }
}

/// `F(n)` with `F(0) = 0`, `F(1) = 1`, modulo 2^64.
pub fn fibonacci(n: u64) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..n {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    a
}
