//! Immutable session records and the sink they are handed to.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionType;

/// One finished or abandoned session.
///
/// Emitted exactly once, at the moment the session ends; the engine keeps no
/// collection of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub session_type: SessionType,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Wall-clock span of the attempt, pauses included.
    pub duration_seconds: u64,
    /// True when the session was closed by reset/skip before reaching zero.
    pub interrupted: bool,
}

/// Append-only consumer of finished sessions.
///
/// Implementations own their failure handling; `add_session` must not raise
/// into the engine.
pub trait HistorySink {
    fn add_session(&self, record: &SessionRecord);
}

impl<S: HistorySink + ?Sized> HistorySink for Rc<S> {
    fn add_session(&self, record: &SessionRecord) {
        (**self).add_session(record)
    }
}

/// In-memory sink for tests and embedders that do their own persistence.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: RefCell<Vec<SessionRecord>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl HistorySink for MemoryHistory {
    fn add_session(&self, record: &SessionRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}
