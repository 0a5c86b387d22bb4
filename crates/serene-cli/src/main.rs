use clap::{Parser, Subcommand};
use serene_core::{Config, ConfigError};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "serene", version, about = "Serene guided breathing and mood check-in CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available breathing patterns
    Patterns,
    /// Breathing sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Mood check-ins
    Mood {
        #[command(subcommand)]
        action: commands::mood::MoodAction,
    },
    /// Finished session history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays parseable.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_env("SERENE_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// `config` runs without a valid config file so a broken one can be reset.
fn dispatch(
    command: Commands,
    config: Result<Config, ConfigError>,
) -> serene_core::Result<()> {
    match command {
        Commands::Patterns => commands::patterns::run(),
        Commands::Session { action } => commands::session::run(action, &config?),
        Commands::Mood { action } => commands::mood::run(action, &config?),
        Commands::History { action } => commands::history::run(action, &config?),
        Commands::Config { action } => commands::config::run(action),
    }
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load();
    init_logging(
        config
            .as_ref()
            .map_or("warn", |config| config.logging.level.as_str()),
    );

    if let Err(e) = dispatch(cli.command, config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
