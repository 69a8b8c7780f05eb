mod config;
pub mod database;
mod memory;

pub use config::Config;
pub use database::{Database, Stats};
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::rc::Rc;

/// State persistence contract consumed by the timer engine: a key-value
/// store holding the single timer snapshot.
///
/// Writes are fire-and-forget. Implementations swallow and log their own
/// failures -- the engine stays correct even when every write fails; only
/// reload-survivability is affected.
pub trait StateStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<S: StateStore + ?Sized> StateStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// Returns `~/.config/tomata/`, or `$TOMATA_DATA_DIR` when set.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("TOMATA_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("tomata"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
