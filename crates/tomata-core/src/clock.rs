//! Time sources.
//!
//! The engine measures intervals on a millisecond timebase and stamps
//! records with wall-clock time. Both come from the [`Clock`] trait so tests
//! can run against a simulated timebase.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};

/// Clock contract consumed by the timer engine.
pub trait Clock {
    /// Milliseconds on a non-decreasing timebase. Countdown anchors derived
    /// from this value are persisted, so the timebase must remain comparable
    /// across process restarts.
    fn now_monotonic_ms(&self) -> u64;

    /// Wall-clock time, used only for record keeping.
    fn now_wall(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_monotonic_ms(&self) -> u64 {
        (**self).now_monotonic_ms()
    }

    fn now_wall(&self) -> DateTime<Utc> {
        (**self).now_wall()
    }
}

/// Epoch-millisecond clock.
///
/// Uses `SystemTime` rather than `Instant` because anchors must survive a
/// process restart to be reconcilable at recovery. Backward system-clock
/// jumps degrade to saturating arithmetic in the countdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_monotonic_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn now_wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for simulated-time tests.
///
/// Wall time is derived from the same counter, so wall-clock deltas in
/// emitted records match the simulated elapsed time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs * 1000);
    }

    pub fn set_ms(&self, ms: u64) {
        self.now_ms.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_monotonic_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn now_wall(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms.get() as i64)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
