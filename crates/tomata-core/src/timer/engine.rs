//! Timer engine implementation.
//!
//! The engine is a state machine over an anchor-based countdown. It owns no
//! thread: the caller invokes `tick()` periodically, and remaining time is
//! recomputed from the anchor on every tick, so cadence never affects the
//! countdown.
//!
//! ## State transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --start--> Running
//! Running --tick-to-zero--> Completed
//! Running|Paused|Completed --reset--> Idle
//! Running|Paused|Completed --skip--> Idle (session type advanced)
//! ```
//!
//! Calling an operation in any other status is a safe no-op (`None`).
//!
//! ## Persistence
//!
//! Every meaningful state change is mirrored into the state store under
//! [`STATE_KEY`]; a state that lands on `Idle` deletes the key instead, so
//! "no persisted state" and "Idle" stay equivalent. Snapshots taken while
//! running carry the remaining value *at the anchor* -- recovery subtracts
//! elapsed-since-anchor exactly once. Recovery runs in the constructor,
//! never writes back, and never restores a running countdown: a stale
//! running snapshot comes back `Paused` (or `Completed` when its time ran
//! out while the process was gone).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::events::Event;
use crate::history::{HistorySink, SessionRecord};
use crate::settings::TimerSettings;
use crate::storage::StateStore;

use super::countdown::{CountdownDriver, Tick, MILLIS_PER_SECOND};
use super::scheduler;
use super::state::{SessionType, TimerState, TimerStatus};

/// Key under which the engine persists its state.
pub const STATE_KEY: &str = "timer_state";

/// Identity of the in-flight session attempt.
///
/// Ephemeral by design: it is never persisted, so a session spanning a
/// process restart is tracked only for its post-recovery window. A
/// pause/resume cycle keeps the same identity; a new one is minted only when
/// no session is in flight.
#[derive(Debug, Clone)]
struct ActiveSession {
    id: String,
    started_at: DateTime<Utc>,
}

/// Snapshot written to the state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedState {
    #[serde(flatten)]
    state: TimerState,
    #[serde(default)]
    anchor_ms: Option<u64>,
}

/// The timer state machine.
///
/// Composes the scheduler (session rotation), the countdown driver (drift
/// correction) and the persistence adapter, and emits one immutable
/// [`SessionRecord`] per finished or abandoned session.
pub struct TimerEngine {
    state: TimerState,
    driver: CountdownDriver,
    active: Option<ActiveSession>,
    clock: Box<dyn Clock>,
    store: Box<dyn StateStore>,
    history: Box<dyn HistorySink>,
}

impl TimerEngine {
    /// Build an engine, recovering any persisted non-idle state.
    ///
    /// Recovery reconciles a stale `Running` snapshot against elapsed time
    /// and restores it `Paused` (or `Completed` at zero); resuming always
    /// requires an explicit `start`. The load path never writes back to the
    /// store.
    pub fn new(
        clock: Box<dyn Clock>,
        store: Box<dyn StateStore>,
        history: Box<dyn HistorySink>,
    ) -> Self {
        let state = recover(store.as_ref(), clock.as_ref());
        Self {
            state,
            driver: CountdownDriver::default(),
            active: None,
            clock,
            store,
            history,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.state.status,
            session_type: self.state.session_type,
            remaining_secs: self.state.remaining_seconds,
            total_secs: self.state.total_seconds,
            completed_sessions: self.state.completed_sessions,
            progress: self.state.progress(),
            display: self.state.formatted_remaining(),
            at: self.clock.now_wall(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reset to a fresh work session: `Idle`, zeroed cycle counter, task
    /// rebound. Valid between sessions only; a no-op while one is in flight.
    pub fn initialize(&mut self, settings: &TimerSettings, task_id: Option<String>) -> Option<Event> {
        if self.in_flight() {
            return None;
        }
        let duration = scheduler::duration_for(SessionType::Work, settings);
        self.driver.stop();
        self.state = TimerState {
            status: TimerStatus::Idle,
            session_type: SessionType::Work,
            remaining_seconds: duration,
            total_seconds: duration,
            completed_sessions: 0,
            current_task_id: task_id,
        };
        self.persist();
        Some(Event::TimerInitialized {
            session_type: SessionType::Work,
            duration_secs: duration,
            at: self.clock.now_wall(),
        })
    }

    /// Start an idle session, or resume a paused one.
    ///
    /// From `Idle` the duration is (re)computed from settings, covering both
    /// a skipped `initialize` and settings changed while idle. From `Paused`
    /// the countdown re-anchors at the current remaining value; no duration
    /// recompute, and the in-flight session keeps its identity.
    pub fn start(&mut self, settings: &TimerSettings) -> Option<Event> {
        let now_wall = self.clock.now_wall();
        match self.state.status {
            TimerStatus::Idle => {
                let duration = scheduler::duration_for(self.state.session_type, settings);
                self.state.remaining_seconds = duration;
                self.state.total_seconds = duration;
                self.state.status = TimerStatus::Running;
                self.driver.start(self.clock.now_monotonic_ms(), duration);
                self.begin_tracking(now_wall);
                self.persist();
                Some(Event::TimerStarted {
                    session_type: self.state.session_type,
                    duration_secs: duration,
                    at: now_wall,
                })
            }
            TimerStatus::Paused => {
                let remaining = self.state.remaining_seconds;
                self.state.status = TimerStatus::Running;
                self.driver.start(self.clock.now_monotonic_ms(), remaining);
                self.begin_tracking(now_wall);
                self.persist();
                Some(Event::TimerResumed {
                    remaining_secs: remaining,
                    at: now_wall,
                })
            }
            TimerStatus::Running | TimerStatus::Completed => None,
        }
    }

    /// Freeze the countdown. The in-flight session stays open; no record is
    /// emitted until reset, skip or completion.
    pub fn pause(&mut self) -> Option<Event> {
        if self.state.status != TimerStatus::Running {
            return None;
        }
        let now = self.clock.now_monotonic_ms();
        let remaining = self
            .driver
            .remaining(now)
            .unwrap_or(self.state.remaining_seconds);
        if remaining == 0 {
            // The countdown already hit zero; deliver the completion rather
            // than parking a finished session in Paused.
            return self.complete();
        }
        self.driver.stop();
        self.state.remaining_seconds = remaining;
        self.state.status = TimerStatus::Paused;
        self.persist();
        Some(Event::TimerPaused {
            remaining_secs: remaining,
            at: self.clock.now_wall(),
        })
    }

    /// Abandon the in-flight session (recorded as interrupted) and return to
    /// the idle baseline of the current session type. Idempotent; a no-op
    /// from `Idle`.
    pub fn reset(&mut self) -> Option<Event> {
        if self.state.status == TimerStatus::Idle {
            return None;
        }
        self.driver.stop();
        self.emit_record(true);
        self.state.remaining_seconds = self.state.total_seconds;
        self.state.status = TimerStatus::Idle;
        self.persist();
        Some(Event::TimerReset {
            at: self.clock.now_wall(),
        })
    }

    /// Abandon the in-flight session (recorded as interrupted) and advance
    /// to the next session type, left unstarted. A skip does not count as a
    /// completion, so the rotation sees the unchanged cycle counter.
    pub fn skip(&mut self, settings: &TimerSettings) -> Option<Event> {
        self.driver.stop();
        self.emit_record(true);
        let from = self.state.session_type;
        let to = scheduler::next_session_type(
            from,
            self.state.completed_sessions,
            settings.sessions_before_long_break,
        );
        let duration = scheduler::duration_for(to, settings);
        self.state.session_type = to;
        self.state.remaining_seconds = duration;
        self.state.total_seconds = duration;
        self.state.status = TimerStatus::Idle;
        self.persist();
        Some(Event::TimerSkipped {
            from,
            to,
            at: self.clock.now_wall(),
        })
    }

    /// Rebind the current/next session to a task. State mutation only.
    pub fn set_task(&mut self, task_id: Option<String>) {
        self.state.current_task_id = task_id;
        self.persist();
    }

    /// Advance the countdown. Call periodically while running; cadence does
    /// not affect the computed remaining time. Returns
    /// `Some(Event::TimerCompleted)` exactly once per session, on the tick
    /// that first observes zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state.status != TimerStatus::Running {
            return None;
        }
        match self.driver.tick(self.clock.now_monotonic_ms()) {
            Tick::Remaining(remaining) => {
                // Per-tick decrements are not persistence-worthy: the stored
                // snapshot already carries the anchor.
                self.state.remaining_seconds = remaining;
                None
            }
            Tick::Completed => self.complete(),
            Tick::Inactive => None,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn in_flight(&self) -> bool {
        matches!(self.state.status, TimerStatus::Running | TimerStatus::Paused)
    }

    fn begin_tracking(&mut self, now_wall: DateTime<Utc>) {
        if self.active.is_some() {
            return;
        }
        self.active = Some(ActiveSession {
            id: Uuid::new_v4().to_string(),
            started_at: now_wall,
        });
    }

    fn complete(&mut self) -> Option<Event> {
        self.driver.stop();
        self.state.remaining_seconds = 0;
        self.state.status = TimerStatus::Completed;
        self.emit_record(false);
        if self.state.session_type.is_work() {
            self.state.completed_sessions += 1;
        }
        self.persist();
        Some(Event::TimerCompleted {
            session_type: self.state.session_type,
            completed_sessions: self.state.completed_sessions,
            at: self.clock.now_wall(),
        })
    }

    /// Close the in-flight session, if any, and hand the record to the
    /// history sink. Taking `active` here is what makes a second reset (or a
    /// skip right after completion) emit nothing.
    fn emit_record(&mut self, interrupted: bool) {
        let Some(active) = self.active.take() else {
            return;
        };
        let ended_at = self.clock.now_wall();
        let duration_seconds = (ended_at - active.started_at).num_seconds().max(0) as u64;
        let record = SessionRecord {
            id: active.id,
            task_id: self.state.current_task_id.clone(),
            session_type: self.state.session_type,
            started_at: active.started_at,
            ended_at,
            duration_seconds,
            interrupted,
        };
        self.history.add_session(&record);
    }

    /// Persistence adapter: mirror the current state into the store. An idle
    /// state is represented by key absence.
    fn persist(&self) {
        if self.state.status == TimerStatus::Idle {
            self.store.remove(STATE_KEY);
            return;
        }
        let mut state = self.state.clone();
        if self.driver.is_ticking() {
            // Running snapshots store remaining-at-anchor so recovery
            // subtracts elapsed-since-anchor exactly once.
            state.remaining_seconds = self.driver.remaining_at_anchor();
        }
        let snapshot = PersistedState {
            state,
            anchor_ms: self.driver.anchor_ms(),
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => self.store.set(STATE_KEY, &json),
            Err(err) => tracing::warn!(%err, "failed to serialize timer snapshot"),
        }
    }
}

/// Read the persisted snapshot and reconcile it against elapsed time.
/// Runs once, from the constructor; must not write to the store.
fn recover(store: &dyn StateStore, clock: &dyn Clock) -> TimerState {
    let Some(raw) = store.get(STATE_KEY) else {
        return TimerState::default();
    };
    let persisted: PersistedState = match serde_json::from_str(&raw) {
        Ok(persisted) => persisted,
        Err(err) => {
            tracing::warn!(%err, "discarding unreadable timer snapshot");
            return TimerState::default();
        }
    };
    let mut state = persisted.state;
    match state.status {
        TimerStatus::Idle => TimerState::default(),
        TimerStatus::Running => {
            let elapsed_secs = persisted
                .anchor_ms
                .map(|anchor| clock.now_monotonic_ms().saturating_sub(anchor) / MILLIS_PER_SECOND)
                .unwrap_or(0);
            state.remaining_seconds = state.remaining_seconds.saturating_sub(elapsed_secs);
            // Never resume ticking on behalf of the user.
            state.status = if state.remaining_seconds > 0 {
                TimerStatus::Paused
            } else {
                TimerStatus::Completed
            };
            tracing::debug!(
                remaining = state.remaining_seconds,
                status = ?state.status,
                "reconciled running snapshot"
            );
            state
        }
        TimerStatus::Paused | TimerStatus::Completed => state,
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::history::MemoryHistory;
    use crate::storage::MemoryStore;

    const T0: u64 = 10_000_000;

    struct Harness {
        engine: TimerEngine,
        clock: Rc<ManualClock>,
        store: Rc<MemoryStore>,
        history: Rc<MemoryHistory>,
    }

    fn harness() -> Harness {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let engine = engine_on(&clock, &store, &history);
        Harness {
            engine,
            clock,
            store,
            history,
        }
    }

    fn engine_on(
        clock: &Rc<ManualClock>,
        store: &Rc<MemoryStore>,
        history: &Rc<MemoryHistory>,
    ) -> TimerEngine {
        TimerEngine::new(
            Box::new(Rc::clone(clock)),
            Box::new(Rc::clone(store)),
            Box::new(Rc::clone(history)),
        )
    }

    fn settings() -> TimerSettings {
        TimerSettings::default()
    }

    /// Two-minute work sessions keep recovery arithmetic easy to follow.
    fn short_settings() -> TimerSettings {
        TimerSettings {
            work_minutes: 2,
            ..TimerSettings::default()
        }
    }

    fn complete_work_session(h: &mut Harness, settings: &TimerSettings) {
        assert!(h.engine.start(settings).is_some());
        h.clock.advance_secs(settings.work_minutes * 60);
        assert!(matches!(h.engine.tick(), Some(Event::TimerCompleted { .. })));
    }

    #[test]
    fn starts_idle_with_no_persisted_state() {
        let h = harness();
        assert_eq!(h.engine.state().status, TimerStatus::Idle);
        assert_eq!(h.engine.state().session_type, SessionType::Work);
        assert_eq!(h.engine.state().completed_sessions, 0);
        assert!(!h.store.contains(STATE_KEY));
    }

    #[test]
    fn start_computes_duration_and_counts_down() {
        let mut h = harness();
        let event = h.engine.start(&settings());
        assert!(matches!(
            event,
            Some(Event::TimerStarted {
                session_type: SessionType::Work,
                duration_secs: 1500,
                ..
            })
        ));
        h.clock.advance_secs(3);
        h.engine.tick();
        assert_eq!(h.engine.state().status, TimerStatus::Running);
        assert_eq!(h.engine.state().remaining_seconds, 1497);
        assert_eq!(h.engine.state().total_seconds, 1500);
    }

    #[test]
    fn tick_cadence_does_not_change_remaining() {
        let mut fast = harness();
        fast.engine.start(&settings());
        for _ in 0..50 {
            fast.clock.advance_ms(100);
            fast.engine.tick();
        }

        let mut slow = harness();
        slow.engine.start(&settings());
        slow.clock.advance_ms(5_000);
        slow.engine.tick();

        assert_eq!(
            fast.engine.state().remaining_seconds,
            slow.engine.state().remaining_seconds
        );
    }

    #[test]
    fn end_to_end_work_session() {
        let mut h = harness();
        h.engine.initialize(&settings(), Some("task-1".to_string()));
        assert!(h.engine.start(&settings()).is_some());
        h.clock.advance_secs(1500);

        let event = h.engine.tick();
        assert!(matches!(
            event,
            Some(Event::TimerCompleted {
                session_type: SessionType::Work,
                completed_sessions: 1,
                ..
            })
        ));
        assert_eq!(h.engine.state().status, TimerStatus::Completed);
        assert_eq!(h.engine.state().remaining_seconds, 0);
        assert_eq!(h.engine.state().completed_sessions, 1);

        let records = h.history.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].session_type, SessionType::Work);
        assert_eq!(records[0].task_id.as_deref(), Some("task-1"));
        assert_eq!(records[0].duration_seconds, 1500);
        assert!(!records[0].interrupted);
    }

    #[test]
    fn completion_fires_exactly_once() {
        let mut h = harness();
        h.engine.start(&short_settings());
        h.clock.advance_secs(120);
        assert!(h.engine.tick().is_some());
        for _ in 0..10 {
            h.clock.advance_secs(1);
            assert!(h.engine.tick().is_none());
        }
        assert_eq!(h.history.len(), 1);
        assert_eq!(h.engine.state().completed_sessions, 1);
    }

    #[test]
    fn break_completion_does_not_increment_counter() {
        let mut h = harness();
        complete_work_session(&mut h, &settings());
        assert!(h.engine.skip(&settings()).is_some());
        assert_eq!(h.engine.state().session_type, SessionType::ShortBreak);

        h.engine.start(&settings());
        h.clock.advance_secs(300);
        let event = h.engine.tick();
        assert!(matches!(
            event,
            Some(Event::TimerCompleted {
                session_type: SessionType::ShortBreak,
                ..
            })
        ));
        assert_eq!(h.engine.state().completed_sessions, 1);
        assert_eq!(h.history.len(), 2);
    }

    #[test]
    fn pause_freezes_remaining() {
        let mut h = harness();
        h.engine.start(&settings());
        h.clock.advance_secs(100);
        let event = h.engine.pause();
        assert!(matches!(
            event,
            Some(Event::TimerPaused {
                remaining_secs: 1400,
                ..
            })
        ));
        h.clock.advance_secs(600);
        assert!(h.engine.tick().is_none());
        assert_eq!(h.engine.state().remaining_seconds, 1400);
        assert!(h.history.is_empty());
    }

    #[test]
    fn resume_continues_from_paused_remaining() {
        let mut h = harness();
        h.engine.start(&settings());
        h.clock.advance_secs(100);
        h.engine.pause();
        h.clock.advance_secs(600);

        let event = h.engine.start(&settings());
        assert!(matches!(
            event,
            Some(Event::TimerResumed {
                remaining_secs: 1400,
                ..
            })
        ));
        h.clock.advance_secs(10);
        h.engine.tick();
        assert_eq!(h.engine.state().remaining_seconds, 1390);
        // Resume re-anchors; it never recomputes the duration.
        assert_eq!(h.engine.state().total_seconds, 1500);
    }

    #[test]
    fn pause_resume_cycle_yields_one_record_spanning_the_pause() {
        let mut h = harness();
        h.engine.start(&short_settings());
        h.clock.advance_secs(30);
        h.engine.pause();
        h.clock.advance_secs(300);
        h.engine.start(&short_settings());
        h.clock.advance_secs(90);
        assert!(h.engine.tick().is_some());

        let records = h.history.records();
        assert_eq!(records.len(), 1);
        // Wall-clock span of the whole attempt: 30s + 300s pause + 90s.
        assert_eq!(records[0].duration_seconds, 420);
        assert!(!records[0].interrupted);
    }

    #[test]
    fn pause_after_time_ran_out_delivers_completion() {
        let mut h = harness();
        h.engine.start(&short_settings());
        h.clock.advance_secs(120);
        let event = h.engine.pause();
        assert!(matches!(event, Some(Event::TimerCompleted { .. })));
        assert_eq!(h.engine.state().status, TimerStatus::Completed);
        assert_eq!(h.history.len(), 1);
        assert!(!h.history.records()[0].interrupted);
    }

    #[test]
    fn reset_records_interruption_and_is_idempotent() {
        let mut h = harness();
        h.engine.start(&settings());
        h.clock.advance_secs(100);
        assert!(h.engine.reset().is_some());

        assert_eq!(h.engine.state().status, TimerStatus::Idle);
        assert_eq!(
            h.engine.state().remaining_seconds,
            h.engine.state().total_seconds
        );
        assert_eq!(h.history.len(), 1);
        assert!(h.history.records()[0].interrupted);
        assert!(!h.store.contains(STATE_KEY));

        // Second reset: no-op, no second record.
        assert!(h.engine.reset().is_none());
        assert_eq!(h.history.len(), 1);
    }

    #[test]
    fn skip_records_interruption_and_keeps_counter() {
        let mut h = harness();
        complete_work_session(&mut h, &settings());
        h.engine.skip(&settings()); // -> ShortBreak, idle
        h.engine.start(&settings());
        h.clock.advance_secs(30);

        let event = h.engine.skip(&settings());
        assert!(matches!(
            event,
            Some(Event::TimerSkipped {
                from: SessionType::ShortBreak,
                to: SessionType::Work,
                ..
            })
        ));
        assert_eq!(h.engine.state().status, TimerStatus::Idle);
        assert_eq!(h.engine.state().completed_sessions, 1);
        assert_eq!(h.history.len(), 2);
        assert!(h.history.records()[1].interrupted);
        assert!(!h.store.contains(STATE_KEY));
    }

    #[test]
    fn skip_after_completion_rotates_with_incremented_count() {
        let mut h = harness();
        complete_work_session(&mut h, &settings());
        let event = h.engine.skip(&settings());
        assert!(matches!(
            event,
            Some(Event::TimerSkipped {
                from: SessionType::Work,
                to: SessionType::ShortBreak,
                ..
            })
        ));
        // The completion already closed the session; skip emits nothing new.
        assert_eq!(h.history.len(), 1);
    }

    #[test]
    fn skip_from_idle_break_rotates_back_to_work_without_record() {
        let mut h = harness();
        complete_work_session(&mut h, &settings());
        h.engine.skip(&settings()); // -> ShortBreak, idle
        let before = h.history.len();

        let event = h.engine.skip(&settings());
        assert!(matches!(
            event,
            Some(Event::TimerSkipped {
                to: SessionType::Work,
                ..
            })
        ));
        assert_eq!(h.history.len(), before);
    }

    #[test]
    fn fourth_completed_work_session_rotates_into_long_break() {
        let mut h = harness();
        let settings = short_settings();
        for _ in 0..3 {
            complete_work_session(&mut h, &settings);
            let event = h.engine.skip(&settings);
            assert!(matches!(
                event,
                Some(Event::TimerSkipped {
                    to: SessionType::ShortBreak,
                    ..
                })
            ));
            h.engine.skip(&settings); // break -> work, left unstarted
        }
        complete_work_session(&mut h, &settings);
        assert_eq!(h.engine.state().completed_sessions, 4);
        let event = h.engine.skip(&settings);
        assert!(matches!(
            event,
            Some(Event::TimerSkipped {
                to: SessionType::LongBreak,
                ..
            })
        ));
    }

    #[test]
    fn misuse_is_a_safe_noop() {
        let mut h = harness();
        assert!(h.engine.pause().is_none());
        assert!(h.engine.reset().is_none());
        assert!(h.engine.tick().is_none());

        h.engine.start(&settings());
        h.clock.advance_secs(2);
        // Double start keeps the original anchor.
        assert!(h.engine.start(&settings()).is_none());
        h.engine.tick();
        assert_eq!(h.engine.state().remaining_seconds, 1498);

        h.clock.advance_secs(1498);
        h.engine.tick();
        assert_eq!(h.engine.state().status, TimerStatus::Completed);
        // Completed has no start transition; only reset/skip/initialize.
        assert!(h.engine.start(&settings()).is_none());
    }

    #[test]
    fn initialize_is_a_noop_while_in_flight() {
        let mut h = harness();
        h.engine.start(&settings());
        h.clock.advance_secs(5);
        assert!(h.engine.initialize(&settings(), None).is_none());
        assert_eq!(h.engine.state().status, TimerStatus::Running);

        h.engine.pause();
        assert!(h.engine.initialize(&settings(), None).is_none());
        assert_eq!(h.engine.state().status, TimerStatus::Paused);
    }

    #[test]
    fn initialize_resets_cycle_and_binds_task() {
        let mut h = harness();
        complete_work_session(&mut h, &settings());
        let event = h.engine.initialize(&settings(), Some("task-9".to_string()));
        assert!(event.is_some());

        let state = h.engine.state();
        assert_eq!(state.status, TimerStatus::Idle);
        assert_eq!(state.session_type, SessionType::Work);
        assert_eq!(state.completed_sessions, 0);
        assert_eq!(state.remaining_seconds, 1500);
        assert_eq!(state.current_task_id.as_deref(), Some("task-9"));
        assert!(!h.store.contains(STATE_KEY));
    }

    #[test]
    fn set_task_rebinds_the_open_session() {
        let mut h = harness();
        h.engine.start(&settings());
        h.engine.set_task(Some("task-2".to_string()));
        h.clock.advance_secs(10);
        h.engine.reset();
        assert_eq!(h.history.records()[0].task_id.as_deref(), Some("task-2"));
    }

    #[test]
    fn recovery_with_time_left_restores_paused() {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let mut engine = engine_on(&clock, &store, &history);
        engine.start(&short_settings());
        drop(engine);

        clock.advance_ms(50_000);
        let recovered = engine_on(&clock, &store, &history);
        assert_eq!(recovered.state().status, TimerStatus::Paused);
        assert_eq!(recovered.state().remaining_seconds, 70);
        assert_eq!(recovered.state().total_seconds, 120);
        // Recovery never writes back.
        assert!(store.contains(STATE_KEY));
        assert!(history.is_empty());
    }

    #[test]
    fn recovery_after_time_ran_out_restores_completed() {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let mut engine = engine_on(&clock, &store, &history);
        engine.start(&short_settings());
        drop(engine);

        clock.advance_ms(150_000);
        let recovered = engine_on(&clock, &store, &history);
        assert_eq!(recovered.state().status, TimerStatus::Completed);
        assert_eq!(recovered.state().remaining_seconds, 0);
        // No record and no counter credit for a session whose tracking died
        // with the process.
        assert!(history.is_empty());
        assert_eq!(recovered.state().completed_sessions, 0);
    }

    #[test]
    fn recovery_restores_paused_state_verbatim() {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let mut engine = engine_on(&clock, &store, &history);
        engine.start(&short_settings());
        clock.advance_secs(10);
        engine.tick();
        engine.pause();
        drop(engine);

        clock.advance_ms(900_000);
        let recovered = engine_on(&clock, &store, &history);
        assert_eq!(recovered.state().status, TimerStatus::Paused);
        assert_eq!(recovered.state().remaining_seconds, 110);
    }

    #[test]
    fn recovered_session_can_be_resumed_and_finished() {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let mut engine = engine_on(&clock, &store, &history);
        engine.start(&short_settings());
        drop(engine);

        clock.advance_ms(50_000);
        let mut recovered = engine_on(&clock, &store, &history);
        assert!(matches!(
            recovered.start(&short_settings()),
            Some(Event::TimerResumed {
                remaining_secs: 70,
                ..
            })
        ));
        clock.advance_secs(70);
        assert!(matches!(
            recovered.tick(),
            Some(Event::TimerCompleted { .. })
        ));
        assert_eq!(recovered.state().completed_sessions, 1);
        // The record covers the post-recovery window only.
        let records = history.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration_seconds, 70);
    }

    #[test]
    fn recovery_discards_unreadable_snapshots() {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        store.set(STATE_KEY, "not json");

        let engine = engine_on(&clock, &store, &history);
        assert_eq!(engine.state().status, TimerStatus::Idle);
        assert_eq!(engine.state(), &TimerState::default());
    }

    #[test]
    fn running_snapshot_survives_task_rebind_without_double_counting() {
        let clock = Rc::new(ManualClock::new(T0));
        let store = Rc::new(MemoryStore::new());
        let history = Rc::new(MemoryHistory::new());
        let mut engine = engine_on(&clock, &store, &history);
        engine.start(&short_settings());
        clock.advance_secs(40);
        engine.tick();
        // Persists a fresh snapshot mid-countdown; remaining must still be
        // measured from the original anchor.
        engine.set_task(Some("task-3".to_string()));
        drop(engine);

        clock.advance_secs(40);
        let recovered = engine_on(&clock, &store, &history);
        assert_eq!(recovered.state().status, TimerStatus::Paused);
        assert_eq!(recovered.state().remaining_seconds, 40);
        assert_eq!(recovered.state().current_task_id.as_deref(), Some("task-3"));
    }
}
