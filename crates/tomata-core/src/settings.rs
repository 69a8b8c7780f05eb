//! Pomodoro interval settings and their boundary validation.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Durations and rotation cadence for the session schedule.
///
/// The engine assumes validated settings; [`TimerSettings::validate`] is the
/// boundary check callers run before handing them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSettings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u64,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,
    /// Completed work sessions between long breaks. Must be >= 1.
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
}

fn default_work_minutes() -> u64 {
    25
}
fn default_short_break_minutes() -> u64 {
    5
}
fn default_long_break_minutes() -> u64 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_before_long_break: default_sessions_before_long_break(),
        }
    }
}

impl TimerSettings {
    /// Reject settings the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error when any duration is zero or the long-break cadence
    /// is zero (which would divide by zero in the rotation).
    pub fn validate(&self) -> Result<(), ValidationError> {
        fn positive(field: &str, value: u64) -> Result<(), ValidationError> {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be at least 1 minute".to_string(),
                });
            }
            Ok(())
        }

        positive("work_minutes", self.work_minutes)?;
        positive("short_break_minutes", self.short_break_minutes)?;
        positive("long_break_minutes", self.long_break_minutes)?;
        if self.sessions_before_long_break == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sessions_before_long_break".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
