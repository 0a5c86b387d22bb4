//! # Serene Core Library
//!
//! This library provides the core logic for the Serene breathing companion.
//! All operations are available to the standalone CLI binary, which is a
//! thin shell over this crate.
//!
//! ## Architecture
//!
//! - **Session Engine**: A tick-driven state machine that cycles through the
//!   Inhale, Hold and Exhale phases of a breathing pattern
//! - **Clock**: Tick sources with scoped subscriptions (tokio interval or manual)
//! - **Runner**: Glue that feeds clock ticks and shell commands into the engine
//! - **Mood**: Five-point mood check-ins with fixed recommendations
//! - **Storage**: Capped session history over SQLite or JSON files, plus
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core breathing state machine
//! - [`SessionRunner`]: Drives one session from a [`Clock`]
//! - [`SessionLog`]: Newest-first, capped history of [`SessionRecord`]s
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod mood;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, EngineError, Result, StorageError, UnknownMood};
pub use events::{Event, Snapshot};
pub use mood::{CheckIn, Mood, MoodEntry, MoodLog, MoodSummary, Recommendation, MOOD_KEY};
pub use storage::{
    Config, Database, HistoryBackend, JsonFileBackend, KvBackend, MemoryBackend, MoodConfig,
    RecordStore, SessionLog, SessionRecord, HISTORY_KEY,
};
pub use timer::{
    BreathingPattern, Clock, IntervalClock, ManualClock, Phase, RunnerCommand, RunnerOptions,
    SessionConfig, SessionEngine, SessionRunner, SessionStatus, TickSubscription,
};
