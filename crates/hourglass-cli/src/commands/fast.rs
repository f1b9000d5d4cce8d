use chrono::Utc;
use clap::Subcommand;
use hourglass_core::storage::{Config, Database};
use hourglass_core::{EngineEvent, FastingProtocol, FastingStateMachine, TimerEngine};
use tokio::sync::{mpsc, watch};

#[derive(Subcommand)]
pub enum FastAction {
    /// Begin a fast now
    Start {
        /// Protocol to fast with, e.g. 16:8 or warrior (default: configured)
        #[arg(long)]
        protocol: Option<FastingProtocol>,
        /// Custom fasting hours, 1-23 (implies --protocol custom)
        #[arg(long)]
        hours: Option<u8>,
    },
    /// Reconcile against the clock and print the snapshot as JSON
    Status,
    /// Stop the current fast before the goal
    Stop {
        /// Drop the session instead of recording it as incomplete
        #[arg(long)]
        discard: bool,
    },
    /// Close the eating window and return to idle
    EndEating,
    /// Drive the live timer loop, printing snapshots and events as JSON lines
    Watch {
        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

pub fn run(action: FastAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let machine = FastingStateMachine::load(Database::open()?)?;
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut engine = TimerEngine::new(machine, events_tx);

    match action {
        FastAction::Start { protocol, hours } => {
            let protocol = match (protocol, hours) {
                (Some(p), _) => p,
                (None, Some(_)) => FastingProtocol::Custom,
                (None, None) => config.fasting.protocol,
            };
            let custom_hours = hours.unwrap_or(config.fasting.custom_hours);
            let snapshot = engine.start_fast(protocol, custom_hours, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        FastAction::Status => {
            let snapshot = engine.on_foreground(Utc::now());
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        FastAction::Stop { discard } => {
            let snapshot = engine.stop(Utc::now(), !discard)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        FastAction::EndEating => {
            let snapshot = engine.end_eating(Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        FastAction::Watch { seconds } => return watch_loop(engine, events_rx, seconds),
    }

    drain_events(&mut events_rx)?;
    Ok(())
}

/// Print events emitted by a one-shot command (milestones caught up on a
/// status check, a completion discovered during a stop, refusals).
fn drain_events(
    events: &mut mpsc::UnboundedReceiver<EngineEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    while let Ok(event) = events.try_recv() {
        println!("{}", serde_json::to_string_pretty(&event)?);
    }
    Ok(())
}

/// Run the engine loop until Ctrl-C (or a deadline), streaming compact
/// JSON lines so the output stays pipeable.
fn watch_loop(
    mut engine: TimerEngine<Database>,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    seconds: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut snapshots = engine.subscribe();
        let snapshot_printer = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let line = serde_json::to_string(&*snapshots.borrow_and_update());
                match line {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        });

        let event_printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        });

        let stopper = tokio::spawn(async move {
            match seconds {
                Some(secs) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = tokio::time::sleep(std::time::Duration::from_secs(secs)) => {}
                    }
                }
                None => {
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
            let _ = stop_tx.send(true);
        });

        engine.run(stop_rx).await;

        snapshot_printer.abort();
        event_printer.abort();
        stopper.abort();
    });
    Ok(())
}
