use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_work(self) -> bool {
        matches!(self, SessionType::Work)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "short-break",
            SessionType::LongBreak => "long-break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "work" => Some(SessionType::Work),
            "short-break" => Some(SessionType::ShortBreak),
            "long-break" => Some(SessionType::LongBreak),
            _ => None,
        }
    }
}

/// The authoritative timer state, owned by the engine.
///
/// Invariants: `remaining_seconds <= total_seconds`; `Idle` implies a fresh,
/// unstarted session (`remaining == total`); `Completed` implies
/// `remaining == 0`. `total_seconds` is fixed when the session begins --
/// changing settings mid-session never resizes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub status: TimerStatus,
    pub session_type: SessionType,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
    /// Finished work sessions; breaks do not count.
    pub completed_sessions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<String>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            session_type: SessionType::Work,
            remaining_seconds: 0,
            total_seconds: 0,
            completed_sessions: 0,
            current_task_id: None,
        }
    }
}

impl TimerState {
    /// Remaining time as zero-padded `MM:SS`. Minutes widen past 99 rather
    /// than wrap.
    pub fn formatted_remaining(&self) -> String {
        let minutes = self.remaining_seconds / 60;
        let seconds = self.remaining_seconds % 60;
        format!("{minutes:02}:{seconds:02}")
    }

    /// Fraction of the session already elapsed, in `0.0..=1.0`.
    /// Zero when no duration has been set.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        (self.total_seconds - self.remaining_seconds) as f64 / self.total_seconds as f64
    }
}
