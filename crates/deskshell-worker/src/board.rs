//! Keyed view over task reports shared by several tasks.

use std::collections::BTreeMap;

use serde::Serialize;

use deskshell_core::{TaskResponse, TaskStatus, TaskTarget};

/// Latest report per target, kept sorted by target name.
///
/// A newer report for a target replaces the older one; reports for other
/// targets are untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    latest: BTreeMap<TaskTarget, TaskResponse>,
}

/// One display row of a [`TaskBoard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRow {
    pub name: String,
    pub timing: String,
    pub status: TaskStatus,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `response`, superseding any earlier report for its target.
    pub fn apply(&mut self, response: TaskResponse) {
        self.latest.insert(response.target.clone(), response);
    }

    /// Latest report for `target`.
    pub fn get(&self, target: &TaskTarget) -> Option<&TaskResponse> {
        self.latest.get(target)
    }

    /// Reports in target order.
    pub fn entries(&self) -> impl Iterator<Item = &TaskResponse> {
        self.latest.values()
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Rows for a name/timing/status table.
    pub fn rows(&self) -> Vec<TaskRow> {
        self.entries()
            .map(|response| TaskRow {
                name: response.target.to_string(),
                timing: response
                    .elapsed_ms()
                    .map(|ms| format!("{ms:.2} ms"))
                    .unwrap_or_else(|| "--".to_string()),
                status: response.status,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskshell_core::{TaskKind, TaskRequest};
    use serde_json::json;
    use std::time::Duration;

    fn running(target: &str) -> TaskResponse {
        TaskResponse::running(&TaskRequest::new(target, json!({})))
    }

    #[test]
    fn test_latest_report_supersedes() {
        let mut board = TaskBoard::new();
        board.apply(running("fibonacci"));
        board.apply(TaskResponse::completed(
            TaskKind::Fibonacci.into(),
            json!({"result": 55}),
            Duration::from_micros(1500),
        ));

        assert_eq!(board.len(), 1);
        let latest = board.get(&TaskKind::Fibonacci.into()).unwrap();
        assert_eq!(latest.status, TaskStatus::Completed);
    }

    #[test]
    fn test_entries_sorted_by_target() {
        let mut board = TaskBoard::new();
        board.apply(running("listing"));
        board.apply(TaskResponse::failed("unknown_kind".into(), json!(null), None));
        board.apply(running("fibonacci"));

        let names: Vec<_> = board.entries().map(|r| r.target.to_string()).collect();
        assert_eq!(names, vec!["fibonacci", "listing", "unknown_kind"]);
    }

    #[test]
    fn test_rows_format_timing() {
        let mut board = TaskBoard::new();
        board.apply(TaskResponse::completed(
            TaskKind::Fibonacci.into(),
            json!({}),
            Duration::from_micros(1500),
        ));
        board.apply(running("listing"));

        let rows = board.rows();
        assert_eq!(rows[0].timing, "1.50 ms");
        assert_eq!(rows[0].status, TaskStatus::Completed);
        assert_eq!(rows[1].timing, "--");
        assert_eq!(rows[1].status, TaskStatus::Running);
    }
}
