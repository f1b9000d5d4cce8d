//! # Hourglass Core Library
//!
//! This library provides the core business logic for the Hourglass
//! intermittent-fasting tracker. It implements a CLI-first philosophy where
//! all operations are available via a standalone CLI binary, with any GUI
//! host being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Phase Machine**: The NotStarted -> Fasting -> Eating cycle, with
//!   every transition persisted alongside its wall-clock anchors
//! - **Timer Engine**: Wall-clock snapshot recomputation plus a cooperative
//!   one-second tick loop; a missed tick can never make the display drift
//! - **Storage**: SQLite-based session history and TOML-based configuration
//! - **Stats**: Streaks and aggregates derived purely from the history
//!
//! ## Key Components
//!
//! - [`FastingStateMachine`]: Phase transitions and session recording
//! - [`TimerEngine`]: Snapshot recomputation, milestones and window events
//! - [`Database`]: History and state persistence
//! - [`Config`]: Application configuration management

pub mod engine;
pub mod error;
pub mod events;
pub mod machine;
pub mod milestones;
pub mod schedule;
pub mod session;
pub mod stats;
pub mod storage;
pub mod water;

pub use engine::{TimerEngine, TimerSnapshot, TICK_INTERVAL};
pub use error::{ConfigError, CoreError, StorageError, TransitionError};
pub use events::EngineEvent;
pub use machine::FastingStateMachine;
pub use milestones::Milestone;
pub use schedule::FastingProtocol;
pub use session::{FastingPhase, FastingSession, PhaseState};
pub use stats::FastingStats;
pub use storage::{Config, Database, HistoryStore};
pub use water::{WaterState, WaterSummary, WaterTracker};
