//! Phase model and session records for the fasting cycle.
//!
//! The cycle moves through three phases:
//!
//! ```text
//! NotStarted ── start ──> Fasting ── goal reached ──> Eating
//!     ^                      │                          │
//!     ├────── stop early ────┘                          │
//!     └────────────── end eating window ────────────────┘
//! ```
//!
//! The phase and its wall-clock anchors always travel together: they are
//! persisted as one [`PhaseState`] blob so a crash can never leave an
//! anchor without a matching phase.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schedule::{FastingProtocol, CUSTOM_HOURS_MAX, CUSTOM_HOURS_MIN};

/// Where the user currently is in the fasting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FastingPhase {
    NotStarted,
    Fasting,
    Eating,
}

impl FastingPhase {
    /// Whether a direct transition to `to` is legal.
    pub fn can_transition_to(&self, to: FastingPhase) -> bool {
        match self {
            FastingPhase::NotStarted => matches!(to, FastingPhase::Fasting),
            FastingPhase::Fasting => {
                matches!(to, FastingPhase::Eating | FastingPhase::NotStarted)
            }
            FastingPhase::Eating => matches!(to, FastingPhase::NotStarted),
        }
    }

    /// All phases reachable in one step from this one.
    pub fn valid_transitions(&self) -> &'static [FastingPhase] {
        match self {
            FastingPhase::NotStarted => &[FastingPhase::Fasting],
            FastingPhase::Fasting => &[FastingPhase::Eating, FastingPhase::NotStarted],
            FastingPhase::Eating => &[FastingPhase::NotStarted],
        }
    }
}

impl Default for FastingPhase {
    fn default() -> Self {
        FastingPhase::NotStarted
    }
}

/// The persisted phase plus its wall-clock anchors.
///
/// `target_hours` is resolved from the protocol at start time; editing the
/// custom-hours preference mid-fast does not move an active goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: FastingPhase,
    /// When the current (or just-finished) fast began.
    pub fasting_started_at: Option<DateTime<Utc>>,
    /// When the eating window opened. Only set while `phase` is `Eating`.
    pub eating_started_at: Option<DateTime<Utc>>,
    pub protocol: FastingProtocol,
    /// Fasting goal in whole hours, fixed at start time.
    pub target_hours: u8,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self {
            phase: FastingPhase::NotStarted,
            fasting_started_at: None,
            eating_started_at: None,
            protocol: FastingProtocol::default(),
            target_hours: FastingProtocol::default().fasting_hours(0),
        }
    }
}

impl PhaseState {
    pub fn target(&self) -> Duration {
        Duration::hours(i64::from(self.target_hours))
    }

    /// Length of the eating window that complements the fasting goal.
    pub fn eating_window(&self) -> Duration {
        Duration::hours(i64::from(24 - self.target_hours.min(24)))
    }

    /// Clamp fields that may have been hand-edited or corrupted on disk
    /// back into their legal ranges. A phase missing its anchors cannot be
    /// resumed and falls back to the idle default.
    pub fn sanitized(mut self) -> Self {
        self.target_hours = self.target_hours.clamp(CUSTOM_HOURS_MIN, CUSTOM_HOURS_MAX);
        if !self.anchors_consistent() {
            return Self {
                protocol: self.protocol,
                target_hours: self.target_hours,
                ..Self::default()
            };
        }
        self
    }

    /// Whether the anchors required by the current phase are present.
    pub fn anchors_consistent(&self) -> bool {
        match self.phase {
            FastingPhase::NotStarted => true,
            FastingPhase::Fasting => self.fasting_started_at.is_some(),
            FastingPhase::Eating => {
                self.fasting_started_at.is_some() && self.eating_started_at.is_some()
            }
        }
    }
}

/// Wall-clock time elapsed between `anchor` and `now`, clamped at zero so
/// a backwards clock adjustment never reports negative elapsed time.
pub fn clamped_elapsed(anchor: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let elapsed = now.signed_duration_since(anchor);
    if elapsed < Duration::zero() {
        Duration::zero()
    } else {
        elapsed
    }
}

/// One finished fast in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastingSession {
    pub id: Uuid,
    pub protocol: FastingProtocol,
    pub target_hours: u8,
    pub started_at: DateTime<Utc>,
    /// Always set for records this engine appends; optional so imported or
    /// partially-written rows still deserialize.
    pub ended_at: Option<DateTime<Utc>>,
    /// True only when the fast reached its target before it ended.
    pub completed: bool,
}

impl FastingSession {
    pub fn duration(&self) -> Option<Duration> {
        self.ended_at
            .map(|ended| clamped_elapsed(self.started_at, ended))
    }

    /// Calendar day (UTC) on which the fast began. Streaks count days, not
    /// sessions.
    pub fn start_date(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}
