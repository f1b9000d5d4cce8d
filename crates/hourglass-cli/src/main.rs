use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "hourglass", version, about = "Hourglass fasting tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fasting cycle control
    Fast {
        #[command(subcommand)]
        action: commands::fast::FastAction,
    },
    /// Streaks and totals
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Daily water tracking
    Water {
        #[command(subcommand)]
        action: commands::water::WaterAction,
    },
    /// Protocol catalog
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Milestone catalog
    Milestones {
        #[command(subcommand)]
        action: commands::milestones::MilestonesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    // diagnostics go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Fast { action } => commands::fast::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Water { action } => commands::water::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Milestones { action } => commands::milestones::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
