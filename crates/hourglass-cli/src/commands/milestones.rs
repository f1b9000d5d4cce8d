use clap::Subcommand;
use hourglass_core::milestones;

#[derive(Subcommand)]
pub enum MilestonesAction {
    /// The full catalog, ascending by hour
    List,
    /// Current and next milestone for a given fasted duration
    At {
        /// Hours fasted so far
        hours: u32,
    },
}

pub fn run(action: MilestonesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MilestonesAction::List => {
            println!("{}", serde_json::to_string_pretty(milestones::all())?);
        }
        MilestonesAction::At { hours } => {
            let row = serde_json::json!({
                "hours": hours,
                "current": milestones::current_for(hours),
                "next": milestones::next_after(hours),
            });
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
    }
    Ok(())
}
