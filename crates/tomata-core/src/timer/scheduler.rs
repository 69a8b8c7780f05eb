//! Session rotation and duration lookup.
//!
//! Pure functions; callers own the completed-session count they pass in.

use super::state::SessionType;
use crate::settings::TimerSettings;

const SECONDS_PER_MINUTE: u64 = 60;

/// Configured duration of `session_type`, in seconds.
pub fn duration_for(session_type: SessionType, settings: &TimerSettings) -> u64 {
    let minutes = match session_type {
        SessionType::Work => settings.work_minutes,
        SessionType::ShortBreak => settings.short_break_minutes,
        SessionType::LongBreak => settings.long_break_minutes,
    };
    minutes.saturating_mul(SECONDS_PER_MINUTE)
}

/// Session type following `current`.
///
/// `completed_after_this_one` is the finished-work-session count in effect
/// once the current session is over; a skip passes the unchanged count since
/// a skipped session never finished. Precondition (enforced at the settings
/// boundary, not here): `sessions_before_long_break >= 1`.
pub fn next_session_type(
    current: SessionType,
    completed_after_this_one: u32,
    sessions_before_long_break: u32,
) -> SessionType {
    debug_assert!(sessions_before_long_break >= 1);
    if current != SessionType::Work {
        return SessionType::Work;
    }
    if completed_after_this_one % sessions_before_long_break == 0 {
        SessionType::LongBreak
    } else {
        SessionType::ShortBreak
    }
}
