use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::SessionRecord;
use crate::timer::{Phase, SessionStatus};

/// Every engine command that changes state produces an Event.
/// The shell renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionConfigured {
        pattern: String,
        target_secs: u64,
        at: DateTime<Utc>,
    },
    SessionStarted {
        pattern: String,
        target_secs: u64,
        phase: Phase,
        secs_remaining: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        secs_remaining: u64,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Session left the active state. `persisted` is false when the
    /// history append failed; the record is still returned here.
    SessionEnded {
        record: SessionRecord,
        persisted: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot(Snapshot),
}

/// Everything the shell needs to render one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub status: SessionStatus,
    pub pattern: String,
    pub phase: Phase,
    pub secs_remaining: u64,
    pub elapsed_secs: u64,
    pub target_secs: u64,
    pub is_running: bool,
    /// 0.0 ..= 1.0
    pub progress: f64,
}
