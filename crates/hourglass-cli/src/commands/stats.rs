use chrono::Utc;
use clap::Subcommand;
use hourglass_core::storage::Database;
use hourglass_core::{FastingStats, HistoryStore};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Streaks, weekly count and fasting totals
    Show,
    /// Completed and abandoned sessions, oldest first
    History,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let sessions = db.load_sessions()?;

    match action {
        StatsAction::Show => {
            let stats = FastingStats::calculate(&sessions, Utc::now());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::History => {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}
