//! deskshell Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - An async runtime
//! - The filesystem or the embedded database
//! - Any UI toolkit
//!
//! All types here describe the orchestration core of deskshell: surfaces,
//! switchable resources, and the background task protocol.

pub mod error;
pub mod ids;
pub mod resource;
pub mod status;
pub mod surface;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use ids::{DispatchId, ResourceId, SurfaceId};
pub use resource::{ResourceConfig, ResourceLayout};
pub use status::{TaskLifecycle, TaskStatus};
pub use surface::{MenuItem, SurfaceCatalog, SurfaceConfig, SurfaceOptions};
pub use task::{TaskKind, TaskRequest, TaskResponse, TaskTarget};
