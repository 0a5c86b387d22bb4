mod clock;
mod engine;
mod pattern;
mod runner;

pub use clock::{Clock, IntervalClock, ManualClock, TickSubscription, TICK_PERIOD};
pub use engine::{EngineState, SessionConfig, SessionEngine, SessionState, SessionStatus};
pub use pattern::{BreathingPattern, Phase, PATTERNS, SESSION_DURATIONS};
pub use runner::{RunnerCommand, RunnerOptions, SessionRunner};
