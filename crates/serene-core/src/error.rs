//! Core error types for serene-core.
//!
//! Every fallible operation in the library reports one of the enums below,
//! grouped under [`CoreError`] for callers that do not care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for serene-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Mood check-in errors
    #[error(transparent)]
    Mood(#[from] UnknownMood),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported synchronously by the breathing session engine.
///
/// None of these change engine state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unknown pattern key or non-positive target duration.
    #[error("Invalid session config for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// `start()` while a session is already active.
    #[error("A session is already running; end it first")]
    AlreadyRunning,

    /// `end()` with no active session.
    #[error("No active session")]
    NotActive,
}

/// Mood key outside the check-in scale.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown mood '{0}' (expected excellent, good, okay, poor or terrible)")]
pub struct UnknownMood(pub String);

/// Persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Stored value could not be decoded
    #[error("Stored value for '{key}' is corrupt: {message}")]
    Corrupt { key: String, message: String },

    /// Filesystem error from a file-backed store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    Save { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the config schema
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Query(err.to_string())
    }
}

impl EngineError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        EngineError::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
