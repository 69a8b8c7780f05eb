//! SQLite-backed session history and engine state persistence.
//!
//! The `sessions` table is the history sink's storage: append-only records
//! of finished or abandoned sessions. The `kv` table backs the engine's
//! single state key. Both trait impls swallow and log failures -- the engine
//! never sees a storage error.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, StateStore};
use crate::error::{CoreError, StorageError};
use crate::history::{HistorySink, SessionRecord};
use crate::timer::SessionType;

/// Aggregate session statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    pub completed_work_sessions: u64,
    pub interrupted_sessions: u64,
    pub total_work_seconds: u64,
    pub total_break_seconds: u64,
}

/// SQLite database at `~/.config/tomata/tomata.db`.
pub struct Database {
    conn: Connection,
}

type RawRow = (String, Option<String>, String, String, String, u64, bool);

impl Database {
    /// Open the database, creating the file and schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("tomata.db");
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate().map_err(StorageError::from)?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               TEXT PRIMARY KEY,
                task_id          TEXT,
                session_type     TEXT NOT NULL,
                started_at       TEXT NOT NULL,
                ended_at         TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                interrupted      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_task_id ON sessions(task_id);",
        )
    }

    // ── Session history ──────────────────────────────────────────────

    /// Append a session record.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO sessions (id, task_id, session_type, started_at, ended_at, duration_seconds, interrupted)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.task_id,
                record.session_type.as_str(),
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                record.duration_seconds,
                record.interrupted,
            ],
        )?;
        Ok(())
    }

    /// Most recent records first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        self.query_records(
            "SELECT id, task_id, session_type, started_at, ended_at, duration_seconds, interrupted
             FROM sessions ORDER BY started_at DESC LIMIT ?1",
            params![limit as i64],
        )
    }

    /// Records whose session started today (UTC), oldest first.
    pub fn sessions_today(&self) -> Result<Vec<SessionRecord>, StorageError> {
        self.query_records(
            "SELECT id, task_id, session_type, started_at, ended_at, duration_seconds, interrupted
             FROM sessions WHERE started_at >= ?1 ORDER BY started_at",
            params![today_start()],
        )
    }

    /// Records bound to `task_id`, oldest first.
    pub fn sessions_for_task(&self, task_id: &str) -> Result<Vec<SessionRecord>, StorageError> {
        self.query_records(
            "SELECT id, task_id, session_type, started_at, ended_at, duration_seconds, interrupted
             FROM sessions WHERE task_id = ?1 ORDER BY started_at",
            params![task_id],
        )
    }

    /// Delete all records, returning how many were removed.
    pub fn clear_sessions(&self) -> Result<usize, StorageError> {
        Ok(self.conn.execute("DELETE FROM sessions", [])?)
    }

    pub fn stats_all(&self) -> Result<Stats, StorageError> {
        self.stats_where("1=1", [])
    }

    pub fn stats_today(&self) -> Result<Stats, StorageError> {
        self.stats_where("started_at >= ?1", params![today_start()])
    }

    fn stats_where(
        &self,
        predicate: &str,
        params: impl rusqlite::Params,
    ) -> Result<Stats, StorageError> {
        let sql = format!(
            "SELECT session_type, interrupted, COUNT(*), COALESCE(SUM(duration_seconds), 0)
             FROM sessions WHERE {predicate} GROUP BY session_type, interrupted"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, u64>(3)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (session_type, interrupted, count, seconds) = row?;
            stats.total_sessions += count;
            if interrupted {
                stats.interrupted_sessions += count;
            }
            match SessionType::parse(&session_type) {
                Some(SessionType::Work) => {
                    stats.total_work_seconds += seconds;
                    if !interrupted {
                        stats.completed_work_sessions += count;
                    }
                }
                Some(_) => stats.total_break_seconds += seconds,
                None => {}
            }
        }
        Ok(stats)
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SessionRecord>, StorageError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u64>(5)?,
                row.get::<_, bool>(6)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row_to_record(row?)?);
        }
        Ok(records)
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or replace a kv entry.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn today_start() -> String {
    format!("{}T00:00:00+00:00", Utc::now().format("%Y-%m-%d"))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

fn row_to_record(row: RawRow) -> Result<SessionRecord, StorageError> {
    let (id, task_id, session_type, started_at, ended_at, duration_seconds, interrupted) = row;
    let session_type = SessionType::parse(&session_type).ok_or_else(|| {
        StorageError::QueryFailed(format!("unknown session type '{session_type}'"))
    })?;
    Ok(SessionRecord {
        id,
        task_id,
        session_type,
        started_at: parse_timestamp(&started_at)?,
        ended_at: parse_timestamp(&ended_at)?,
        duration_seconds,
        interrupted,
    })
}

impl StateStore for Database {
    fn get(&self, key: &str) -> Option<String> {
        match self.kv_get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%key, %err, "state read failed");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.kv_set(key, value) {
            tracing::warn!(%key, %err, "state write failed");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = self.kv_remove(key) {
            tracing::warn!(%key, %err, "state removal failed");
        }
    }
}

impl HistorySink for Database {
    fn add_session(&self, record: &SessionRecord) {
        if let Err(err) = self.record_session(record) {
            tracing::warn!(id = %record.id, %err, "failed to record session");
        }
    }
}
