//! deskshell Runtime Library
//!
//! This crate provides the orchestration core of the deskshell application
//! shell: the surface registry, the switchable resource pool, and trigger
//! routing to the worker dispatcher.

pub mod config;
pub mod error;
pub mod host;
pub mod orchestrator;
pub mod pool;
pub mod store;
pub mod surface;
pub mod trigger;

pub use config::AppConfig;
pub use error::{HostError, PoolError, RuntimeError};
pub use host::{Delivery, HeadlessHost};
pub use orchestrator::Orchestrator;
pub use pool::{Connector, ResourcePool};
pub use store::SqliteConnector;
pub use surface::{SurfaceHandle, SurfaceHost, SurfaceMessage, SurfaceRegistry};
pub use trigger::{Outcome, Trigger};
