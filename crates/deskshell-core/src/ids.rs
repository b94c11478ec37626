//! Newtype wrappers for identifiers to ensure type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

/// Stable identifier of a UI surface (e.g. `"main"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(String);

impl SurfaceId {
    /// Identifier of the primary application surface.
    pub const MAIN: &'static str = "main";
    /// Identifier of the launch splash surface.
    pub const SPLASH: &'static str = "splash";
    /// Identifier of the background task monitor surface.
    pub const THREADING: &'static str = "threading";

    /// Create a new SurfaceId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SurfaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SurfaceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a switchable backing store.
///
/// Id `0` is the template: every other id is bootstrapped as a copy of it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ResourceId(u32);

impl ResourceId {
    /// The template store id.
    pub const TEMPLATE: ResourceId = ResourceId(0);

    /// Create a new ResourceId.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw numeric id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true if this is the template id.
    pub fn is_template(self) -> bool {
        self == Self::TEMPLATE
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ResourceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for ResourceId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| CoreError::InvalidInput(format!("not a resource id: {s:?}")))
    }
}

/// Unique identifier for one dispatched task request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchId(String);

impl DispatchId {
    /// Generate a new random DispatchId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_id_generate() {
        let id1 = DispatchId::generate();
        let id2 = DispatchId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_surface_id_display() {
        let id = SurfaceId::new("main");
        assert_eq!(format!("{}", id), "main");
        assert_eq!(id, SurfaceId::from(SurfaceId::MAIN));
    }

    #[test]
    fn test_resource_id_parse() {
        assert_eq!("3".parse::<ResourceId>().unwrap(), ResourceId::new(3));
        assert_eq!(" 0 ".parse::<ResourceId>().unwrap(), ResourceId::TEMPLATE);
        assert!("abc".parse::<ResourceId>().is_err());
        assert!("-1".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_resource_id_serde_transparent() {
        let json = serde_json::to_string(&ResourceId::new(7)).unwrap();
        assert_eq!(json, "7");
        let id: ResourceId = serde_json::from_str("7").unwrap();
        assert_eq!(id.get(), 7);
    }
}
