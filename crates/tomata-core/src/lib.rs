//! # Tomata Core Library
//!
//! Core business logic for the tomata Pomodoro timer: a persistent,
//! drift-corrected countdown state machine plus the storage it persists
//! through. The CLI binary is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Timer engine**: a state machine over an anchor-based countdown. The
//!   caller invokes `tick()` periodically; remaining time is recomputed from
//!   the anchor on every tick, so tick cadence never affects the countdown.
//! - **Persistence**: every non-idle state change is mirrored into a
//!   key-value store. At construction the engine reconciles a stale running
//!   snapshot against elapsed time and restores it paused -- it never resumes
//!   ticking on its own after a restart.
//! - **History**: a finished or abandoned session becomes an immutable
//!   record, handed to a sink the moment it ends. The engine keeps none.
//! - **Storage**: SQLite-based session history and kv state, TOML-based
//!   configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: the timer state machine
//! - [`Database`]: session history and kv persistence
//! - [`Config`]: application configuration
//! - [`Clock`], [`StateStore`], [`HistorySink`]: collaborator contracts

pub mod clock;
pub mod error;
pub mod events;
pub mod history;
pub mod settings;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use history::{HistorySink, MemoryHistory, SessionRecord};
pub use settings::TimerSettings;
pub use storage::{Config, Database, MemoryStore, StateStore, Stats};
pub use timer::{SessionType, TimerEngine, TimerState, TimerStatus};
