//! Runtime errors surfaced to trigger callers.

use std::path::PathBuf;

use deskshell_core::SurfaceId;
use thiserror::Error;

/// Resource pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Creating the data directory or copying the template store failed.
    #[error("Failed to provision store at '{}': {source}", path.display())]
    Provisioning {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store exists but could not be opened.
    #[error("Failed to connect to store: {0}")]
    Connect(String),
}

/// Errors reported by a surface host.
#[derive(Debug, Error)]
#[error("Surface host error: {0}")]
pub struct HostError(pub String);

/// Errors returned to the caller of a trigger.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No config registered for the requested surface.
    #[error("Config not found for surface: {0}")]
    ConfigNotFound(SurfaceId),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Host(#[from] HostError),
}
