use clap::Subcommand;
use hourglass_core::storage::Config;
use hourglass_core::FastingProtocol;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Every protocol with its resolved split
    List,
    /// One protocol in detail
    Show {
        /// Protocol to show, e.g. 14:10 (default: configured)
        protocol: Option<FastingProtocol>,
    },
}

fn describe(protocol: FastingProtocol, config: &Config) -> serde_json::Value {
    let (fasting, eating) = protocol.resolve(config.fasting.custom_hours);
    serde_json::json!({
        "protocol": protocol.as_token(),
        "label": protocol.label(),
        "fasting_hours": fasting,
        "eating_hours": eating,
        "default": protocol == config.fasting.protocol,
    })
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        ScheduleAction::List => {
            let rows: Vec<_> = FastingProtocol::all()
                .iter()
                .map(|p| describe(*p, &config))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        ScheduleAction::Show { protocol } => {
            let protocol = protocol.unwrap_or(config.fasting.protocol);
            let row = describe(protocol, &config);
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
    }
    Ok(())
}
