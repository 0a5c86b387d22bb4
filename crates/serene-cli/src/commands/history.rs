use clap::Subcommand;
use serene_core::{Config, RecordStore, HISTORY_KEY};

use super::open_history;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Print recent sessions as JSON, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete all stored sessions
    Clear,
}

pub fn run(action: HistoryAction, config: &Config) -> serene_core::Result<()> {
    let history = open_history(config)?;

    match action {
        HistoryAction::List { limit } => {
            let mut records = history.load_records(HISTORY_KEY)?;
            if let Some(limit) = limit {
                records.truncate(limit);
            }
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        HistoryAction::Clear => {
            history.clear(HISTORY_KEY)?;
            println!("history cleared");
        }
    }
    Ok(())
}
