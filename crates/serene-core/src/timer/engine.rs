//! Breathing session engine.
//!
//! A tick-driven state machine. It owns no timer: the caller (normally a
//! [`SessionRunner`](super::SessionRunner)) invokes `tick()` once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Active(Inhale) --tick/toggle--> Active --end--> Idle
//! ```
//!
//! ## Tick accounting
//!
//! A tick with time left in the phase counts down one second and adds one
//! to the elapsed total. A tick with nothing left moves to the next phase
//! and reloads its duration without touching the elapsed total.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(SessionConfig::new("4-7-8", 180)?, store);
//! engine.start()?;
//! // Once per second:
//! engine.tick(); // Some(Event::PhaseChanged) on a phase boundary
//! engine.end()?; // appends a SessionRecord
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pattern::{BreathingPattern, Phase};
use crate::error::EngineError;
use crate::events::{Event, Snapshot};
use crate::storage::{RecordStore, SessionRecord, HISTORY_KEY};

/// Pattern and target length chosen before a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pattern: &'static BreathingPattern,
    target_secs: u64,
}

impl SessionConfig {
    /// # Errors
    /// `InvalidConfig` for an unknown pattern key or a zero target.
    pub fn new(pattern_key: &str, target_secs: u64) -> Result<Self, EngineError> {
        let pattern = BreathingPattern::find(pattern_key).ok_or_else(|| {
            EngineError::invalid("pattern", format!("unknown breathing pattern '{pattern_key}'"))
        })?;
        if target_secs == 0 {
            return Err(EngineError::invalid(
                "target_secs",
                "must be greater than zero",
            ));
        }
        Ok(Self {
            pattern,
            target_secs,
        })
    }

    pub fn pattern(&self) -> &'static BreathingPattern {
        self.pattern
    }

    pub fn target_secs(&self) -> u64 {
        self.target_secs
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pattern: &super::pattern::PATTERNS[0],
            target_secs: super::pattern::SESSION_DURATIONS[0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
}

/// Mutable state of an active session. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    pub secs_remaining: u64,
    pub elapsed_secs: u64,
    pub is_running: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Active(SessionState),
}

/// Core session engine.
///
/// Generic over the history store so tests can inject an in-memory or
/// failing store.
pub struct SessionEngine<S> {
    config: SessionConfig,
    state: EngineState,
    store: S,
    history_key: String,
}

impl<S: RecordStore> SessionEngine<S> {
    /// Create an idle engine that appends finished sessions to `store`.
    pub fn new(config: SessionConfig, store: S) -> Self {
        Self {
            config,
            state: EngineState::Idle,
            store,
            history_key: HISTORY_KEY.to_string(),
        }
    }

    pub fn with_history_key(mut self, key: impl Into<String>) -> Self {
        self.history_key = key.into();
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn history_key(&self) -> &str {
        &self.history_key
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, EngineState::Active(_))
    }

    pub fn status(&self) -> SessionStatus {
        match &self.state {
            EngineState::Idle => SessionStatus::Idle,
            EngineState::Active(s) if s.is_running => SessionStatus::Running,
            EngineState::Active(_) => SessionStatus::Paused,
        }
    }

    /// Idle reads as Inhale.
    pub fn phase(&self) -> Phase {
        match &self.state {
            EngineState::Active(s) => s.phase,
            EngineState::Idle => Phase::Inhale,
        }
    }

    pub fn secs_remaining(&self) -> u64 {
        match &self.state {
            EngineState::Active(s) => s.secs_remaining,
            EngineState::Idle => 0,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        match &self.state {
            EngineState::Active(s) => s.elapsed_secs,
            EngineState::Idle => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(&self.state, EngineState::Active(s) if s.is_running)
    }

    /// Elapsed over target, clamped to 0.0 ..= 1.0.
    pub fn progress_fraction(&self) -> f64 {
        let target = self.config.target_secs;
        if target == 0 {
            return 0.0;
        }
        (self.elapsed_secs() as f64 / target as f64).clamp(0.0, 1.0)
    }

    pub fn target_reached(&self) -> bool {
        self.is_active() && self.elapsed_secs() >= self.config.target_secs
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status(),
            pattern: self.config.pattern.key.to_string(),
            phase: self.phase(),
            secs_remaining: self.secs_remaining(),
            elapsed_secs: self.elapsed_secs(),
            target_secs: self.config.target_secs,
            is_running: self.is_running(),
            progress: self.progress_fraction(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Select pattern and target. Any active session is discarded
    /// without a record.
    ///
    /// # Errors
    /// `InvalidConfig`; the engine is left untouched.
    pub fn configure(&mut self, pattern_key: &str, target_secs: u64) -> Result<Event, EngineError> {
        let config = SessionConfig::new(pattern_key, target_secs)?;
        if self.is_active() {
            tracing::debug!("configure discarded an active session");
        }
        self.config = config;
        self.state = EngineState::Idle;
        Ok(Event::SessionConfigured {
            pattern: config.pattern.key.to_string(),
            target_secs,
            at: Utc::now(),
        })
    }

    /// # Errors
    /// `AlreadyRunning` while a session is active; that session is untouched.
    pub fn start(&mut self) -> Result<Event, EngineError> {
        if self.is_active() {
            return Err(EngineError::AlreadyRunning);
        }
        let pattern = self.config.pattern;
        let now = Utc::now();
        self.state = EngineState::Active(SessionState {
            phase: Phase::Inhale,
            secs_remaining: pattern.inhale_secs,
            elapsed_secs: 0,
            is_running: true,
            started_at: now,
        });
        tracing::info!(
            "breathing session started: {} for {}s",
            pattern.key,
            self.config.target_secs
        );
        Ok(Event::SessionStarted {
            pattern: pattern.key.to_string(),
            target_secs: self.config.target_secs,
            phase: Phase::Inhale,
            secs_remaining: pattern.inhale_secs,
            at: now,
        })
    }

    /// Pause or resume. Counters are kept. No-op while idle.
    pub fn toggle_running(&mut self) -> Option<Event> {
        let EngineState::Active(s) = &mut self.state else {
            return None;
        };
        s.is_running = !s.is_running;
        let at = Utc::now();
        Some(if s.is_running {
            Event::SessionResumed {
                elapsed_secs: s.elapsed_secs,
                at,
            }
        } else {
            Event::SessionPaused {
                elapsed_secs: s.elapsed_secs,
                at,
            }
        })
    }

    /// Call once per second. Exactly one transition per call.
    ///
    /// Returns `Some(Event::PhaseChanged)` on a phase boundary.
    pub fn tick(&mut self) -> Option<Event> {
        let EngineState::Active(s) = &mut self.state else {
            return None;
        };
        if !s.is_running {
            return None;
        }

        if s.secs_remaining > 0 {
            s.secs_remaining -= 1;
            s.elapsed_secs += 1;
            return None;
        }

        let from = s.phase;
        s.phase = from.next();
        s.secs_remaining = self.config.pattern.duration_of(s.phase);
        tracing::debug!("phase {:?} -> {:?} at {}s", from, s.phase, s.elapsed_secs);
        Some(Event::PhaseChanged {
            from,
            to: s.phase,
            secs_remaining: s.secs_remaining,
            elapsed_secs: s.elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Finish the session, append its record and return to idle.
    ///
    /// A failed append is logged and reported through `persisted: false`;
    /// the engine is idle either way.
    ///
    /// # Errors
    /// `NotActive` when there is no session to end.
    pub fn end(&mut self) -> Result<Event, EngineError> {
        let EngineState::Active(session) = std::mem::replace(&mut self.state, EngineState::Idle)
        else {
            return Err(EngineError::NotActive);
        };

        let now = Utc::now();
        let record = SessionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            pattern_key: self.config.pattern.key.to_string(),
            pattern_name: self.config.pattern.display_name.to_string(),
            elapsed_secs: session.elapsed_secs,
            target_secs: self.config.target_secs,
            completed: session.elapsed_secs >= self.config.target_secs,
            timestamp: now,
        };

        let persisted = match self.store.append(&self.history_key, record.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("failed to save breathing session {}: {}", record.id, e);
                false
            }
        };
        tracing::info!(
            "breathing session ended after {}s (completed: {})",
            record.elapsed_secs,
            record.completed
        );

        Ok(Event::SessionEnded {
            record,
            persisted,
            at: now,
        })
    }
}
