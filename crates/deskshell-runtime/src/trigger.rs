//! Triggers routed by the orchestrator and the outcomes they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use deskshell_core::{DispatchId, ResourceId, SurfaceId, TaskRequest};

/// Named request arriving from a surface or from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "route")]
pub enum Trigger {
    /// Show a surface, creating it if it is not live.
    #[serde(rename = "surface.get")]
    OpenSurface { id: SurfaceId },

    #[serde(rename = "surface.close")]
    CloseSurface { id: SurfaceId },

    /// Deliver arbitrary data to a surface, creating it if needed.
    #[serde(rename = "surface.send")]
    SendToSurface {
        id: SurfaceId,
        #[serde(default)]
        payload: Value,
    },

    /// Switch to a resource. Without an id, reacquires the current one.
    #[serde(rename = "resource.acquire")]
    AcquireResource {
        #[serde(default)]
        id: Option<ResourceId>,
    },

    #[serde(rename = "resource.release_current")]
    ReleaseCurrentResource,

    /// Run background work on behalf of a surface.
    #[serde(rename = "task.dispatch")]
    DispatchTask {
        surface: SurfaceId,
        request: TaskRequest,
    },

    #[serde(rename = "app.info")]
    AppInfo,

    /// The application was reactivated (dock click and the like).
    #[serde(rename = "app.activate")]
    Activate,
}

impl Trigger {
    /// Wire name of the trigger.
    pub fn route(&self) -> &'static str {
        match self {
            Trigger::OpenSurface { .. } => "surface.get",
            Trigger::CloseSurface { .. } => "surface.close",
            Trigger::SendToSurface { .. } => "surface.send",
            Trigger::AcquireResource { .. } => "resource.acquire",
            Trigger::ReleaseCurrentResource => "resource.release_current",
            Trigger::DispatchTask { .. } => "task.dispatch",
            Trigger::AppInfo => "app.info",
            Trigger::Activate => "app.activate",
        }
    }
}

/// Result of handling a [`Trigger`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// A surface is live.
    Surface {
        id: SurfaceId,
        instance: u64,
        opened_at: DateTime<Utc>,
    },

    Closed {
        id: SurfaceId,
        /// Whether the surface was live before the close.
        was_live: bool,
        /// Surfaces still live afterwards.
        remaining: usize,
    },

    Delivered { id: SurfaceId },

    Resource { id: ResourceId },

    /// Id of the released resource, if one was active.
    Released { id: Option<ResourceId> },

    Dispatched {
        dispatch_id: DispatchId,
        surface: SurfaceId,
    },

    AppInfo { name: String, version: String },

    /// Surface opened by the activation, if any.
    Activated { opened: Option<SurfaceId> },
}

impl Outcome {
    /// True when this outcome left no live surface behind.
    pub fn closed_last_surface(&self) -> bool {
        matches!(self, Outcome::Closed { remaining: 0, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskshell_core::{TaskKind, TaskTarget};
    use serde_json::json;

    fn parse(value: Value) -> Trigger {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_surface_routes() {
        assert_eq!(
            parse(json!({"route": "surface.get", "id": "main"})),
            Trigger::OpenSurface { id: "main".into() }
        );
        assert_eq!(
            parse(json!({"route": "surface.send", "id": "threading"})),
            Trigger::SendToSurface {
                id: "threading".into(),
                payload: Value::Null,
            }
        );
    }

    #[test]
    fn test_parse_resource_acquire_optional_id() {
        assert_eq!(
            parse(json!({"route": "resource.acquire", "id": 3})),
            Trigger::AcquireResource {
                id: Some(ResourceId::new(3))
            }
        );
        assert_eq!(
            parse(json!({"route": "resource.acquire"})),
            Trigger::AcquireResource { id: None }
        );
    }

    #[test]
    fn test_parse_task_dispatch() {
        let trigger = parse(json!({
            "route": "task.dispatch",
            "surface": "threading",
            "request": {"target": "fibonacci", "payload": {"num": 10}}
        }));
        let Trigger::DispatchTask { surface, request } = &trigger else {
            panic!("unexpected trigger: {trigger:?}");
        };
        assert_eq!(surface.as_str(), "threading");
        assert_eq!(request.target, TaskTarget::Known(TaskKind::Fibonacci));
        assert_eq!(trigger.route(), "task.dispatch");
    }

    #[test]
    fn test_unknown_route_rejected() {
        let result = serde_json::from_value::<Trigger>(json!({"route": "window.open"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_route_matches_wire_name() {
        for trigger in [
            Trigger::ReleaseCurrentResource,
            Trigger::AppInfo,
            Trigger::Activate,
            Trigger::CloseSurface { id: "main".into() },
        ] {
            let value = serde_json::to_value(&trigger).unwrap();
            assert_eq!(value["route"], trigger.route());
        }
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = Outcome::Closed {
            id: "main".into(),
            was_live: true,
            remaining: 0,
        };
        assert!(outcome.closed_last_surface());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"kind": "closed", "id": "main", "was_live": true, "remaining": 0})
        );
        assert_eq!(
            serde_json::to_value(Outcome::Released { id: None }).unwrap(),
            json!({"kind": "released", "id": null})
        );
    }
}
