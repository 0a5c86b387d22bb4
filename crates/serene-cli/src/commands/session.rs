use std::io::BufRead;
use std::time::Duration;

use clap::{Args, Subcommand};
use serene_core::{
    Clock, Config, Event, IntervalClock, ManualClock, RunnerCommand, RunnerOptions, SessionConfig,
    SessionEngine, SessionRunner, SessionStatus,
};
use tokio::sync::mpsc;

use super::{open_history, History};

#[derive(Args)]
pub struct SessionArgs {
    /// Breathing pattern key (see `serene patterns`)
    #[arg(long)]
    pattern: Option<String>,
    /// Target session length in seconds
    #[arg(long)]
    duration: Option<u64>,
    /// Print one JSON snapshot per tick instead of a status line
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a live session. Enter pauses/resumes, `q` + Enter or Ctrl-C ends it
    Run {
        #[command(flatten)]
        args: SessionArgs,
    },
    /// Run a session on a scripted clock without waiting on real time
    Simulate {
        #[command(flatten)]
        args: SessionArgs,
        /// Number of ticks to deliver before the clock stops
        #[arg(long)]
        ticks: usize,
    },
}

pub fn run(action: SessionAction, config: &Config) -> serene_core::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match action {
        SessionAction::Run { args } => {
            let mut engine = build_engine(&args, config)?;
            let ended = runtime.block_on(run_live(&mut engine, config, args.json))?;
            report_end(&ended, args.json)
        }
        SessionAction::Simulate { args, ticks } => {
            let mut engine = build_engine(&args, config)?;
            let clock = ManualClock::scripted(ticks);
            let ended = runtime.block_on(drive(&mut engine, &clock, config, None, args.json))?;
            report_end(&ended, args.json)
        }
    }
}

/// Engine configured from the flags, falling back to the config defaults.
fn build_engine(
    args: &SessionArgs,
    config: &Config,
) -> serene_core::Result<SessionEngine<History>> {
    let pattern = args
        .pattern
        .as_deref()
        .unwrap_or(&config.session.default_pattern);
    let duration = args.duration.unwrap_or(config.session.default_duration_secs);

    let mut engine = SessionEngine::new(SessionConfig::default(), open_history(config)?);
    let configured = engine.configure(pattern, duration)?;
    render(&configured, args.json);
    Ok(engine)
}

async fn run_live(
    engine: &mut SessionEngine<History>,
    config: &Config,
    json: bool,
) -> serene_core::Result<Event> {
    let (tx, rx) = mpsc::unbounded_channel();

    let ctrl_c = tx.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c.send(RunnerCommand::End);
        }
    });

    // Blocking stdin reads stay off the runtime so shutdown never waits on them.
    let keys = tx;
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let cmd = match line.trim() {
                "q" | "quit" => RunnerCommand::End,
                _ => RunnerCommand::TogglePause,
            };
            if keys.send(cmd).is_err() {
                break;
            }
        }
    });

    let result = drive(engine, &IntervalClock, config, Some(rx), json).await;
    signal_task.abort();
    result
}

async fn drive<C: Clock + ?Sized>(
    engine: &mut SessionEngine<History>,
    clock: &C,
    config: &Config,
    commands: Option<mpsc::UnboundedReceiver<RunnerCommand>>,
    json: bool,
) -> serene_core::Result<Event> {
    let options = RunnerOptions {
        period: Duration::from_millis(config.session.tick_interval_ms),
        auto_finish: config.session.auto_finish,
    };
    let runner = SessionRunner::new(engine, clock, options);
    let ended = runner
        .run(commands, |event| render(event, json))
        .await?;
    Ok(ended)
}

fn render(event: &Event, json: bool) {
    match event {
        Event::StateSnapshot(snap) if json => {
            if let Ok(line) = serde_json::to_string(snap) {
                println!("{line}");
            }
        }
        Event::StateSnapshot(snap) => {
            let status = match snap.status {
                SessionStatus::Paused => " (paused)",
                _ => "",
            };
            println!(
                "{:<12} {:>2}s   {} / {}   {:>3.0}%{}",
                snap.phase.label(),
                snap.secs_remaining,
                mmss(snap.elapsed_secs),
                mmss(snap.target_secs),
                snap.progress * 100.0,
                status
            );
        }
        Event::SessionConfigured { pattern, target_secs, .. } if !json => {
            println!("{pattern}: {} target", mmss(*target_secs));
        }
        Event::SessionStarted { pattern, target_secs, .. } if !json => {
            println!("Starting {pattern} for {}", mmss(*target_secs));
        }
        Event::SessionPaused { .. } if !json => println!("paused"),
        Event::SessionResumed { .. } if !json => println!("resumed"),
        _ => {}
    }
}

fn report_end(ended: &Event, json: bool) -> serene_core::Result<()> {
    if json {
        println!("{}", serde_json::to_string(ended)?);
    } else {
        println!("{}", serde_json::to_string_pretty(ended)?);
    }
    if let Event::SessionEnded {
        persisted: false, ..
    } = ended
    {
        eprintln!("warning: session could not be saved to history");
    }
    Ok(())
}

fn mmss(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
