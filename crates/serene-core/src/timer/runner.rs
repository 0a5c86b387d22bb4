//! Drives one breathing session from a clock subscription.
//!
//! The runner holds the engine for the lifetime of a session. It applies
//! each delivered tick, forwards control commands from the shell, and ends
//! the session when the target is reached, the shell asks it to, or the
//! tick source goes away. The subscription is released on every exit path.

use std::time::Duration;

use tokio::sync::mpsc;

use super::clock::{Clock, TICK_PERIOD};
use super::engine::SessionEngine;
use crate::error::EngineError;
use crate::events::Event;
use crate::storage::RecordStore;

/// Control messages from the shell while a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    TogglePause,
    End,
}

#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    pub period: Duration,
    /// End the session as soon as elapsed time reaches the target.
    pub auto_finish: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            period: TICK_PERIOD,
            auto_finish: true,
        }
    }
}

pub struct SessionRunner<'a, S, C: ?Sized> {
    engine: &'a mut SessionEngine<S>,
    clock: &'a C,
    options: RunnerOptions,
}

impl<'a, S: RecordStore, C: Clock + ?Sized> SessionRunner<'a, S, C> {
    pub fn new(engine: &'a mut SessionEngine<S>, clock: &'a C, options: RunnerOptions) -> Self {
        Self {
            engine,
            clock,
            options,
        }
    }

    /// Run the session to its end and return the `SessionEnded` event.
    ///
    /// Starts the engine if it is idle. `observe` sees every event the
    /// engine produces, followed by one `StateSnapshot` per applied tick.
    ///
    /// # Errors
    /// `InvalidConfig` for a zero tick period, before anything starts.
    /// Otherwise propagates engine errors from `start`/`end`.
    pub async fn run<F>(
        self,
        mut commands: Option<mpsc::UnboundedReceiver<RunnerCommand>>,
        mut observe: F,
    ) -> Result<Event, EngineError>
    where
        F: FnMut(&Event),
    {
        if self.options.period.is_zero() {
            return Err(EngineError::invalid("period", "must be greater than zero"));
        }
        let engine = self.engine;
        if !engine.is_active() {
            let started = engine.start()?;
            observe(&started);
        }

        let mut ticks = self.clock.subscribe(self.options.period);
        loop {
            tokio::select! {
                biased;
                cmd = recv_command(&mut commands) => match cmd {
                    Some(RunnerCommand::TogglePause) => {
                        if let Some(event) = engine.toggle_running() {
                            observe(&event);
                        }
                    }
                    Some(RunnerCommand::End) => {
                        tracing::debug!("session ended on request");
                        break;
                    }
                    None => commands = None,
                },
                tick = ticks.next_tick() => match tick {
                    Some(()) => {
                        if let Some(event) = engine.tick() {
                            observe(&event);
                        }
                        observe(&Event::StateSnapshot(engine.snapshot()));
                        if self.options.auto_finish && engine.target_reached() {
                            tracing::debug!("session target reached");
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("tick source closed");
                        break;
                    }
                },
            }
        }
        ticks.cancel();
        drop(ticks);

        let ended = engine.end()?;
        observe(&ended);
        Ok(ended)
    }
}

/// Next command, or pending forever once there is no command channel.
async fn recv_command(
    commands: &mut Option<mpsc::UnboundedReceiver<RunnerCommand>>,
) -> Option<RunnerCommand> {
    match commands {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBackend, SessionLog, HISTORY_KEY};
    use crate::timer::{ManualClock, Phase, SessionConfig};

    fn engine(pattern: &str, target: u64) -> SessionEngine<SessionLog<MemoryBackend>> {
        SessionEngine::new(
            SessionConfig::new(pattern, target).unwrap(),
            SessionLog::new(MemoryBackend::new()),
        )
    }

    #[tokio::test]
    async fn auto_finish_ends_at_target() {
        let mut engine = engine("box", 6);
        let clock = ManualClock::scripted(100);

        let mut snapshots = 0;
        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        let ended = runner
            .run(None, |event| {
                if matches!(event, Event::StateSnapshot(_)) {
                    snapshots += 1;
                }
            })
            .await
            .unwrap();

        let Event::SessionEnded { record, persisted, .. } = ended else {
            panic!("expected SessionEnded");
        };
        assert!(persisted);
        assert!(record.completed);
        assert_eq!(record.elapsed_secs, 6);
        // 4 inhale + 1 boundary + 2 hold
        assert_eq!(snapshots, 7);
        assert!(!engine.is_active());
        assert_eq!(engine.store().load_records(HISTORY_KEY).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn without_auto_finish_runs_past_target() {
        let mut engine = engine("box", 2);
        let clock = ManualClock::scripted(6);
        let options = RunnerOptions {
            auto_finish: false,
            ..RunnerOptions::default()
        };

        let runner = SessionRunner::new(&mut engine, &clock, options);
        let ended = runner.run(None, |_| {}).await.unwrap();
        assert!(matches!(ended, Event::SessionEnded { record, .. } if record.elapsed_secs == 5));
    }

    #[tokio::test]
    async fn closed_clock_ends_session_early() {
        let mut engine = engine("4-7-8", 180);
        let clock = ManualClock::scripted(0);

        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        let ended = runner.run(None, |_| {}).await.unwrap();
        let Event::SessionEnded { record, .. } = ended else {
            panic!("expected SessionEnded");
        };
        assert!(!record.completed);
        assert_eq!(record.elapsed_secs, 0);
    }

    #[tokio::test]
    async fn subscription_is_released_after_end_command() {
        let mut engine = engine("4-7-8", 180);
        let clock = ManualClock::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        let (ended, ()) = tokio::join!(runner.run(Some(rx), |_| {}), async {
            tokio::task::yield_now().await;
            assert_eq!(clock.live_subscriptions(), 1);
            clock.advance(2);
            tx.send(RunnerCommand::End).unwrap();
        });

        assert!(matches!(ended, Ok(Event::SessionEnded { .. })));
        assert_eq!(clock.live_subscriptions(), 0);
    }

    #[tokio::test]
    async fn phase_changes_are_observed() {
        let mut engine = engine("4-7-8", 180);
        let clock = ManualClock::scripted(5);

        let mut phases = Vec::new();
        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        runner
            .run(None, |event| {
                if let Event::PhaseChanged { to, .. } = event {
                    phases.push(*to);
                }
            })
            .await
            .unwrap();
        assert_eq!(phases, vec![Phase::Hold]);
    }

    #[tokio::test]
    async fn ticks_while_paused_do_not_count() {
        let mut engine = engine("box", 180);
        let clock = ManualClock::scripted(3);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(RunnerCommand::TogglePause).unwrap();

        let mut paused = false;
        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        let ended = runner
            .run(Some(rx), |event| {
                if matches!(event, Event::SessionPaused { .. }) {
                    paused = true;
                }
            })
            .await
            .unwrap();
        assert!(paused);
        assert!(matches!(ended, Event::SessionEnded { record, .. } if record.elapsed_secs == 0));
        drop(tx);
    }

    #[tokio::test]
    async fn dropped_command_sender_keeps_running() {
        let mut engine = engine("box", 3);
        let clock = ManualClock::scripted(10);
        let (tx, rx) = mpsc::unbounded_channel::<RunnerCommand>();
        drop(tx);

        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        let ended = runner.run(Some(rx), |_| {}).await.unwrap();
        assert!(matches!(ended, Event::SessionEnded { record, .. } if record.completed));
    }

    #[tokio::test]
    async fn zero_period_is_rejected_before_start() {
        let mut engine = engine("box", 2);
        let clock = ManualClock::new();
        let options = RunnerOptions {
            period: Duration::ZERO,
            ..RunnerOptions::default()
        };

        let runner = SessionRunner::new(&mut engine, &clock, options);
        let err = runner.run(None, |_| {}).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig { ref field, .. } if field == "period"));
        assert!(!engine.is_active());
        assert_eq!(clock.live_subscriptions(), 0);
        assert!(engine.store().load_records(HISTORY_KEY).unwrap().is_empty());
    }

    #[tokio::test]
    async fn already_active_engine_is_not_restarted() {
        let mut engine = engine("box", 180);
        engine.start().unwrap();
        engine.tick();
        let clock = ManualClock::scripted(1);

        let runner = SessionRunner::new(&mut engine, &clock, RunnerOptions::default());
        let ended = runner.run(None, |_| {}).await.unwrap();
        assert!(matches!(ended, Event::SessionEnded { record, .. } if record.elapsed_secs == 2));
    }
}
