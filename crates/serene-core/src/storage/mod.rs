mod backend;
mod config;
pub mod database;
pub mod history;
pub mod json_file;

pub use backend::{KvBackend, MemoryBackend};
pub use config::{Config, HistoryBackend, HistoryConfig, LoggingConfig, MoodConfig, SessionDefaults};
pub use database::Database;
pub use history::{RecordStore, SessionLog, SessionRecord, DEFAULT_MAX_RECORDS, HISTORY_KEY};
pub use json_file::JsonFileBackend;

use std::path::PathBuf;

/// Returns the data directory used for config and history.
///
/// `SERENE_DATA_DIR` wins when set. Otherwise `~/.config/serene[-dev]/`
/// depending on `SERENE_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("SERENE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SERENE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("serene-dev")
            } else {
                base_dir.join("serene")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
