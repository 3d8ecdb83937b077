//! Lifecycle status, admission phase and serializable session snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Session-level status reflecting fault outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    /// Not running: the session has been disposed.
    Stopped,
    /// Every callback failure so far was absorbed.
    Running,
    /// An entry action failed and no handler absorbed it.
    Error,
}

/// Position of a session in its admission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Nothing executing; a posted transition starts immediately.
    Idle,
    /// A transition is executing; posts are rejected.
    InTransition,
    /// An entry action is executing; one post may be deferred.
    InState,
}

/// Point-in-time view of a session, suitable for logging or export.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub current_state: String,
    pub lifecycle: Lifecycle,
    pub phase: Phase,
    pub pending: Option<String>,
    pub started_at: DateTime<Utc>,
    pub total_elapsed: Duration,
    pub state_elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_to_json() {
        let snapshot = SessionSnapshot {
            id: Uuid::new_v4(),
            current_state: "Two".to_string(),
            lifecycle: Lifecycle::Running,
            phase: Phase::InState,
            pending: Some("Next".to_string()),
            started_at: Utc::now(),
            total_elapsed: Duration::from_millis(20),
            state_elapsed: Duration::from_millis(5),
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["current_state"], "Two");
        assert_eq!(json["lifecycle"], "Running");
        assert_eq!(json["phase"], "InState");
        assert_eq!(json["pending"], "Next");
    }
}
