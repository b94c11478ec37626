//! Task request/response protocol exchanged with background workers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{CoreError, TaskStatus};

/// Closed set of background work a worker knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// CPU-bound Fibonacci computation.
    Fibonacci,
    /// Directory listing of the worker's listing root.
    Listing,
}

impl TaskKind {
    /// Every known task kind.
    pub const ALL: [TaskKind; 2] = [TaskKind::Fibonacci, TaskKind::Listing];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Fibonacci => "fibonacci",
            TaskKind::Listing => "listing",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::UnknownTaskKind(s.to_string()))
    }
}

/// Target named by a request.
///
/// Requests arrive as free-form strings, so a target that names no
/// [`TaskKind`] is still representable and can be answered with `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskTarget {
    Known(TaskKind),
    Unrecognized(String),
}

impl TaskTarget {
    pub fn as_str(&self) -> &str {
        match self {
            TaskTarget::Known(kind) => kind.as_str(),
            TaskTarget::Unrecognized(name) => name,
        }
    }

    /// The task kind, if the target is recognized.
    pub fn kind(&self) -> Option<TaskKind> {
        match self {
            TaskTarget::Known(kind) => Some(*kind),
            TaskTarget::Unrecognized(_) => None,
        }
    }
}

impl From<String> for TaskTarget {
    fn from(s: String) -> Self {
        match s.parse::<TaskKind>() {
            Ok(kind) => TaskTarget::Known(kind),
            Err(_) => TaskTarget::Unrecognized(s),
        }
    }
}

impl From<&str> for TaskTarget {
    fn from(s: &str) -> Self {
        TaskTarget::from(s.to_string())
    }
}

impl From<TaskKind> for TaskTarget {
    fn from(kind: TaskKind) -> Self {
        TaskTarget::Known(kind)
    }
}

impl From<TaskTarget> for String {
    fn from(target: TaskTarget) -> Self {
        target.as_str().to_string()
    }
}

// Display order is by target name.
impl Ord for TaskTarget {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for TaskTarget {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of background work to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Which task kind to run.
    pub target: TaskTarget,

    /// Task input, opaque to the protocol.
    #[serde(default)]
    pub payload: Value,
}

impl TaskRequest {
    /// Create a new TaskRequest.
    pub fn new(target: impl Into<TaskTarget>, payload: Value) -> Self {
        Self {
            target: target.into(),
            payload,
        }
    }
}

/// A status report for a dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Target of the originating request.
    pub target: TaskTarget,

    /// Lifecycle status being reported.
    pub status: TaskStatus,

    /// Result payload for `Completed`, request echo otherwise.
    #[serde(default)]
    pub payload: Value,

    /// Time spent in the unit of work, excluding dispatch overhead.
    /// Encoded as fractional milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timing_ms")]
    pub timing: Option<Duration>,
}

impl TaskResponse {
    /// Work is about to start.
    pub fn running(request: &TaskRequest) -> Self {
        Self {
            target: request.target.clone(),
            status: TaskStatus::Running,
            payload: request.payload.clone(),
            timing: None,
        }
    }

    /// Work finished with `result`.
    pub fn completed(target: TaskTarget, result: Value, timing: Duration) -> Self {
        Self {
            target,
            status: TaskStatus::Completed,
            payload: result,
            timing: Some(timing),
        }
    }

    /// Request was rejected or the unit of work faulted.
    pub fn failed(target: TaskTarget, payload: Value, timing: Option<Duration>) -> Self {
        Self {
            target,
            status: TaskStatus::Failed,
            payload,
            timing,
        }
    }

    /// Elapsed time in fractional milliseconds, if measured.
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.timing.map(|d| d.as_secs_f64() * 1000.0)
    }
}

mod timing_ms {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(timing: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match timing {
            Some(d) => s.serialize_some(&(d.as_secs_f64() * 1000.0)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(d)? {
            Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(Duration::from_secs_f64(ms / 1000.0))),
            Some(ms) => Err(D::Error::custom(format!("invalid timing: {ms} ms"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_parses_known_kinds() {
        assert_eq!(
            TaskTarget::from("fibonacci"),
            TaskTarget::Known(TaskKind::Fibonacci)
        );
        assert_eq!(TaskTarget::from("listing").kind(), Some(TaskKind::Listing));
        assert_eq!(TaskTarget::from("unknown_kind").kind(), None);
    }

    #[test]
    fn test_request_from_json() {
        let request: TaskRequest =
            serde_json::from_value(json!({"target": "fibonacci", "payload": {"num": 10}}))
                .unwrap();
        assert_eq!(request.target.kind(), Some(TaskKind::Fibonacci));
        assert_eq!(request.payload["num"], 10);

        let request: TaskRequest =
            serde_json::from_value(json!({"target": "unknown_kind"})).unwrap();
        assert_eq!(
            request.target,
            TaskTarget::Unrecognized("unknown_kind".to_string())
        );
        assert!(request.payload.is_null());
    }

    #[test]
    fn test_targets_order_by_name() {
        let mut targets = vec![
            TaskTarget::from("listing"),
            TaskTarget::from("zeta"),
            TaskTarget::from("fibonacci"),
            TaskTarget::from("alpha"),
        ];
        targets.sort();
        let names: Vec<_> = targets.iter().map(|t| t.as_str()).collect();
        assert_eq!(names, vec!["alpha", "fibonacci", "listing", "zeta"]);
    }

    #[test]
    fn test_response_constructors() {
        let request = TaskRequest::new(TaskKind::Fibonacci, json!({"num": 3}));
        let running = TaskResponse::running(&request);
        assert_eq!(running.status, TaskStatus::Running);
        assert!(running.timing.is_none());

        let done = TaskResponse::completed(
            request.target.clone(),
            json!({"result": 2}),
            Duration::from_millis(5),
        );
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.elapsed_ms(), Some(5.0));

        let json = serde_json::to_value(&running).unwrap();
        assert_eq!(json["target"], "fibonacci");
        assert_eq!(json["status"], "running");
        assert!(json.get("timing").is_none());
    }

    #[test]
    fn test_timing_encoded_as_milliseconds() {
        let done = TaskResponse::completed(
            TaskKind::Fibonacci.into(),
            json!({"result": 55}),
            Duration::from_micros(1500),
        );
        let value = serde_json::to_value(&done).unwrap();
        assert_eq!(value["timing"], 1.5);

        let parsed: TaskResponse = serde_json::from_value(value).unwrap();
        assert!((parsed.elapsed_ms().unwrap() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_negative_timing_rejected() {
        let result = serde_json::from_value::<TaskResponse>(json!({
            "target": "fibonacci",
            "status": "completed",
            "timing": -1.0
        }));
        assert!(result.is_err());
    }
}
