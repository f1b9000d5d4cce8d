//! Day-scoped water intake counter.
//!
//! The count only means anything for the stored day. Every mutation first
//! runs the rollover guard, so a consumer can never observe yesterday's
//! glasses attributed to today.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WATER_GOAL: u32 = 8;

/// Persisted counter state: glasses drunk, daily goal, and the day the
/// count belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterState {
    pub glasses: u32,
    pub goal: u32,
    pub day: NaiveDate,
}

impl WaterState {
    pub fn new(goal: u32, day: NaiveDate) -> Self {
        Self {
            glasses: 0,
            goal,
            day,
        }
    }
}

/// Mutable view over a [`WaterState`] with the rollover guard built in.
#[derive(Debug, Clone)]
pub struct WaterTracker {
    state: WaterState,
}

/// Snapshot handed to UIs after an operation.
#[derive(Debug, Clone, Serialize)]
pub struct WaterSummary {
    pub glasses: u32,
    pub goal: u32,
    pub goal_reached: bool,
    pub day: NaiveDate,
}

impl WaterTracker {
    pub fn new(state: WaterState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &WaterState {
        &self.state
    }

    /// Zero the count when the stored day is not `today`. Returns whether a
    /// reset happened. Idempotent within a day; the goal carries over.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) -> bool {
        if self.state.day != today {
            self.state.glasses = 0;
            self.state.day = today;
            true
        } else {
            false
        }
    }

    /// Count one glass for `today` and return the new count. The count may
    /// exceed the goal; there is no upper clamp.
    pub fn record_glass(&mut self, today: NaiveDate) -> u32 {
        self.reset_if_new_day(today);
        self.state.glasses = self.state.glasses.saturating_add(1);
        self.state.glasses
    }

    /// Undo one glass for `today`, flooring at zero.
    pub fn remove_glass(&mut self, today: NaiveDate) -> u32 {
        self.reset_if_new_day(today);
        self.state.glasses = self.state.glasses.saturating_sub(1);
        self.state.glasses
    }

    pub fn set_goal(&mut self, goal: u32) {
        self.state.goal = goal;
    }

    pub fn goal_reached(&self) -> bool {
        self.state.glasses >= self.state.goal
    }

    pub fn summary(&self) -> WaterSummary {
        WaterSummary {
            glasses: self.state.glasses,
            goal: self.state.goal,
            goal_reached: self.goal_reached(),
            day: self.state.day,
        }
    }
}
