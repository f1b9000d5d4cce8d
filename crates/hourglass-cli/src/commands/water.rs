use chrono::Utc;
use clap::Subcommand;
use hourglass_core::storage::{Config, Database};
use hourglass_core::{HistoryStore, WaterState, WaterTracker};

#[derive(Subcommand)]
pub enum WaterAction {
    /// Today's count against the goal
    Show,
    /// Record one glass
    Add,
    /// Undo one glass (floors at zero)
    Remove,
    /// Change the daily goal
    SetGoal {
        /// Glasses per day, at least 1
        goal: u32,
    },
}

pub fn run(action: WaterAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let today = Utc::now().date_naive();

    // First ever use seeds the goal from config; after that the goal lives
    // in the persisted state.
    let state = match db.load_water_state()? {
        Some(state) => state,
        None => WaterState::new(Config::load_or_default().water.goal_glasses, today),
    };
    let mut tracker = WaterTracker::new(state);
    tracker.reset_if_new_day(today);

    match action {
        WaterAction::Show => {}
        WaterAction::Add => {
            tracker.record_glass(today);
        }
        WaterAction::Remove => {
            tracker.remove_glass(today);
        }
        WaterAction::SetGoal { goal } => {
            if goal == 0 {
                return Err("goal must be at least 1".into());
            }
            tracker.set_goal(goal);
        }
    }

    db.save_water_state(tracker.state())?;
    println!("{}", serde_json::to_string_pretty(&tracker.summary())?);
    Ok(())
}
