use chrono::{Duration, Utc};
use clap::Subcommand;
use serene_core::{Config, Mood, MoodSummary};

use super::open_moods;

#[derive(Subcommand)]
pub enum MoodAction {
    /// Record how you feel right now and print suggestions
    CheckIn {
        /// One of: excellent, good, okay, poor, terrible
        mood: String,
        /// Optional free-text note stored with the check-in
        #[arg(long)]
        note: Option<String>,
    },
    /// Print recent check-ins as JSON, newest first
    History {
        /// Maximum number of check-ins to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Average score and most common mood over recent days
    Insights {
        /// Look-back window in days
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Delete all stored check-ins
    Clear,
}

pub fn run(action: MoodAction, config: &Config) -> serene_core::Result<()> {
    match action {
        MoodAction::CheckIn { mood, note } => {
            let mood: Mood = mood.parse()?;
            let check_in = open_moods(config)?.check_in(mood, note)?;
            println!("{}", serde_json::to_string_pretty(&check_in)?);
        }
        MoodAction::History { limit } => {
            let mut entries = open_moods(config)?.entries()?;
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        MoodAction::Insights { days } => {
            let entries = open_moods(config)?.entries()?;
            let since = Utc::now().checked_sub_signed(Duration::days(i64::from(days)));
            let recent = entries
                .iter()
                .filter(|e| since.map_or(true, |since| e.timestamp >= since));
            let summary = MoodSummary::from_entries(recent);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        MoodAction::Clear => {
            open_moods(config)?.clear()?;
            println!("mood history cleared");
        }
    }
    Ok(())
}
