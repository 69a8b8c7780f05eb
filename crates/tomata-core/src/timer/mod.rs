mod countdown;
mod engine;
mod scheduler;
mod state;

pub use countdown::{CountdownDriver, Tick};
pub use engine::{TimerEngine, STATE_KEY};
pub use scheduler::{duration_for, next_session_type};
pub use state::{SessionType, TimerState, TimerStatus};
