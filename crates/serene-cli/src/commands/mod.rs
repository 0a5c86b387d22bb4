pub mod config;
pub mod history;
pub mod mood;
pub mod patterns;
pub mod session;

use serene_core::{Config, KvBackend, MoodLog, SessionLog, StorageError};

pub(crate) type History = SessionLog<Box<dyn KvBackend>>;
pub(crate) type Moods = MoodLog<Box<dyn KvBackend>>;

/// Open the history log configured for this data directory.
pub(crate) fn open_history(config: &Config) -> Result<History, StorageError> {
    let backend = config.open_backend()?;
    Ok(SessionLog::with_capacity(backend, config.history.max_records))
}

/// Mood check-ins share the history backend under their own key.
pub(crate) fn open_moods(config: &Config) -> Result<Moods, StorageError> {
    let backend = config.open_backend()?;
    Ok(MoodLog::with_capacity(backend, config.mood.max_entries))
}
