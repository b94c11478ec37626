//! Dispatcher configuration.

use std::path::PathBuf;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Capacity of each per-request response channel.
    pub channel_capacity: usize,

    /// Directory listed by the `listing` task.
    pub listing_root: PathBuf,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 16,
            listing_root: PathBuf::from("."),
        }
    }
}
