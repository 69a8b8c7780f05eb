use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerStatus};

/// Every state change in the engine produces an `Event`.
///
/// Observers consume the event returned by each operation; completion in
/// particular is delivered this way exactly once, and there is no second
/// detection path for a UI to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerInitialized {
        session_type: SessionType,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStarted {
        session_type: SessionType,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        session_type: SessionType,
        completed_sessions: u32,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: SessionType,
        to: SessionType,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: TimerStatus,
        session_type: SessionType,
        remaining_secs: u64,
        total_secs: u64,
        completed_sessions: u32,
        progress: f64,
        display: String,
        at: DateTime<Utc>,
    },
}
