//! Engine events.
//!
//! Discrete, notification-worthy moments emitted while the timer runs. The
//! core only emits; the host decides how to render each one (banner, push
//! notification, haptic). Every event carries the wall-clock instant it
//! was observed at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A milestone threshold was crossed. Fired at most once per threshold
    /// per fast.
    MilestoneReached {
        hours: u32,
        title: String,
        at: DateTime<Utc>,
    },
    /// The fast reached its goal and rolled into the eating window.
    FastCompleted {
        target_hours: u8,
        fasted_secs: i64,
        at: DateTime<Utc>,
    },
    /// One hour or less remains in the eating window. Fired once per window.
    EatingWindowClosingSoon {
        remaining_minutes: i64,
        at: DateTime<Utc>,
    },
    /// The eating window has fully elapsed. The phase stays `Eating` until
    /// the user acts.
    EatingWindowClosed { at: DateTime<Utc> },
    /// Tactile feedback for a user-initiated moment.
    HapticPulse { at: DateTime<Utc> },
    /// An operation was refused because the current phase does not allow it.
    TransitionRefused { reason: String, at: DateTime<Utc> },
}
