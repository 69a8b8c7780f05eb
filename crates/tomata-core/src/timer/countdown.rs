//! Anchor-based countdown arithmetic.
//!
//! Remaining time is recomputed from a fixed anchor on every tick instead of
//! decrementing a counter per tick, so scheduler jitter, missed ticks and
//! variable cadence cannot drift the countdown. The tick interval is a
//! responsiveness knob only; it never changes the computed value.

use serde::{Deserialize, Serialize};

pub(crate) const MILLIS_PER_SECOND: u64 = 1000;

/// Outcome of a tick recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not anchored; nothing to do.
    Inactive,
    /// Still counting down.
    Remaining(u64),
    /// The countdown just reached zero. Delivered at most once per start.
    Completed,
}

/// Drift-corrected countdown: a monotonic anchor plus the remaining seconds
/// at that instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountdownDriver {
    anchor_ms: Option<u64>,
    remaining_at_anchor: u64,
}

impl CountdownDriver {
    /// Anchor the countdown at `now_ms` with `remaining` seconds left.
    /// No-op when already anchored.
    pub fn start(&mut self, now_ms: u64, remaining: u64) {
        if self.anchor_ms.is_some() {
            return;
        }
        self.anchor_ms = Some(now_ms);
        self.remaining_at_anchor = remaining;
    }

    /// Drop the anchor; the countdown stops advancing.
    pub fn stop(&mut self) {
        self.anchor_ms = None;
    }

    pub fn is_ticking(&self) -> bool {
        self.anchor_ms.is_some()
    }

    pub fn anchor_ms(&self) -> Option<u64> {
        self.anchor_ms
    }

    /// Remaining seconds at the instant the countdown was anchored.
    pub fn remaining_at_anchor(&self) -> u64 {
        self.remaining_at_anchor
    }

    /// Remaining whole seconds at `now_ms`, or `None` when not anchored.
    /// Depends only on `now_ms - anchor`, never on sampling cadence.
    pub fn remaining(&self, now_ms: u64) -> Option<u64> {
        let anchor = self.anchor_ms?;
        let elapsed_secs = now_ms.saturating_sub(anchor) / MILLIS_PER_SECOND;
        Some(self.remaining_at_anchor.saturating_sub(elapsed_secs))
    }

    /// Recompute at `now_ms`. The zero crossing latches: the first tick that
    /// observes zero returns [`Tick::Completed`] and stops the countdown, so
    /// completion cannot be reported twice.
    pub fn tick(&mut self, now_ms: u64) -> Tick {
        let Some(remaining) = self.remaining(now_ms) else {
            return Tick::Inactive;
        };
        if remaining == 0 {
            self.anchor_ms = None;
            return Tick::Completed;
        }
        Tick::Remaining(remaining)
    }
}
