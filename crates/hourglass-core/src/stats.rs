//! Streak and aggregate statistics derived from the session history.
//!
//! All numbers are computed in one pass over completed sessions; nothing
//! here touches storage or the clock directly, which keeps every rule
//! testable with hand-built histories.
//!
//! Streaks count calendar days (UTC), not sessions: two completed fasts
//! started on the same day collapse into one streak day, and a gap of a
//! full day breaks the run.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::session::FastingSession;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastingStats {
    /// Consecutive qualifying days ending today or yesterday. Yesterday
    /// still counts so the streak survives until today's fast finishes.
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completed: u32,
    /// Completed sessions started within the last seven days.
    pub completed_this_week: u32,
    pub total_fasted_hours: f64,
    pub longest_fast_hours: f64,
}

impl FastingStats {
    /// Compute every statistic from `sessions`. Only records with
    /// `completed == true` participate; an empty or all-abandoned history
    /// yields all zeros.
    pub fn calculate(sessions: &[FastingSession], now: DateTime<Utc>) -> Self {
        let completed: Vec<&FastingSession> =
            sessions.iter().filter(|s| s.completed).collect();
        if completed.is_empty() {
            return Self::default();
        }

        // one entry per calendar day; a second fast on the same day neither
        // extends nor breaks a streak
        let mut days: Vec<NaiveDate> = completed.iter().map(|s| s.start_date()).collect();
        days.sort_unstable();
        days.dedup();

        let week_ago = now - Duration::days(7);
        let completed_this_week = completed
            .iter()
            .filter(|s| s.started_at > week_ago)
            .count() as u32;

        let mut total_fasted_hours = 0.0;
        let mut longest_fast_hours: f64 = 0.0;
        for session in &completed {
            if let Some(duration) = session.duration() {
                let hours = duration.num_seconds() as f64 / 3600.0;
                total_fasted_hours += hours;
                longest_fast_hours = longest_fast_hours.max(hours);
            }
        }

        Self {
            current_streak: current_streak(&days, now.date_naive()),
            longest_streak: longest_streak(&days),
            total_completed: completed.len() as u32,
            completed_this_week,
            total_fasted_hours,
            longest_fast_hours,
        }
    }
}

/// Walk backwards from the most recent day. The run may anchor on today or
/// on yesterday; each further step must be exactly one day earlier.
fn current_streak(days_ascending: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut expected = today;
    for &day in days_ascending.iter().rev() {
        if day == expected {
            // matches the day we were looking for
        } else if streak == 0 && Some(day) == today.checked_sub_days(Days::new(1)) {
            expected = day;
        } else {
            break;
        }
        streak += 1;
        expected = match expected.checked_sub_days(Days::new(1)) {
            Some(previous) => previous,
            None => break,
        };
    }
    streak
}

/// Longest run of days where each gap is at most one day.
fn longest_streak(days_ascending: &[NaiveDate]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;
    for &day in days_ascending {
        run = match previous {
            Some(p) if day.signed_duration_since(p).num_days() <= 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}
