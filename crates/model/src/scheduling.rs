//! Scheduling cycle identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Correlation identifier for all work belonging to one scheduling cycle of
/// one cluster.
///
/// Minted once per cycle and threaded through every reconcile call; it has no
/// identity beyond the cycle and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchedulingId(String);

impl SchedulingId {
    /// Mints a fresh identifier for a new scheduling cycle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SchedulingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SchedulingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduling_ids_are_unique() {
        assert_ne!(SchedulingId::new(), SchedulingId::new());
    }

    #[test]
    fn test_scheduling_id_is_stable_once_minted() {
        let id = SchedulingId::new();
        assert_eq!(id.clone(), id);
        assert_eq!(id.to_string(), id.as_str());
    }
}
