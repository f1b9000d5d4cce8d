//! Timer engine implementation.
//!
//! The engine is wall-clock based: every pass recomputes elapsed and
//! remaining time from the persisted anchors, so a missed or delayed tick
//! can never make the display drift. Ticks only change *when* the user
//! sees an update, never *what* they see.
//!
//! Recomputation runs through two entry points:
//! - [`TimerEngine::recompute`] for a single pass (commands, app resume)
//! - [`TimerEngine::run`] for the cooperative 1-second loop, cancelled
//!   through a `watch` signal at the next tick boundary
//!
//! A pass may roll the machine from `Fasting` into `Eating` when the goal
//! has been reached; one-shot announcements (milestones, eating-window
//! warnings) latch inside the engine so they fire at most once per fast.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crate::error::CoreError;
use crate::events::EngineEvent;
use crate::machine::FastingStateMachine;
use crate::milestones::{self, Milestone};
use crate::schedule::FastingProtocol;
use crate::session::{clamped_elapsed, FastingPhase};
use crate::storage::HistoryStore;

/// Period of the cooperative tick loop.
pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);

/// Everything a UI needs to render the current instant, tagged by phase.
///
/// `Error` carries states that cannot be rendered, such as a phase whose
/// anchors were lost to corruption; it never panics the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TimerSnapshot {
    NotStarted,
    Fasting {
        protocol: FastingProtocol,
        started_at: DateTime<Utc>,
        target_hours: u8,
        elapsed_secs: i64,
        remaining_secs: i64,
        /// 0.0 ..= 1.0 toward the fasting goal.
        progress: f64,
        current_milestone: Milestone,
        next_milestone: Option<Milestone>,
        at: DateTime<Utc>,
    },
    Eating {
        protocol: FastingProtocol,
        started_at: DateTime<Utc>,
        window_hours: u8,
        elapsed_secs: i64,
        /// Floored at zero once the window has fully elapsed.
        remaining_secs: i64,
        progress: f64,
        fast_started_at: DateTime<Utc>,
        /// Length of the fast that opened this window.
        fasted_secs: i64,
        at: DateTime<Utc>,
    },
    Error {
        reason: String,
    },
}

/// Recomputes snapshots and emits one-shot events on top of the phase
/// machine.
///
/// The announcement watermark and window latches live here, not in
/// storage: they are per-run display state, and losing them on restart
/// costs at most one repeated announcement.
pub struct TimerEngine<S: HistoryStore> {
    machine: FastingStateMachine<S>,
    /// Highest elapsed whole hour already announced for the current fast.
    last_announced_hour: u32,
    closing_soon_fired: bool,
    window_closed_fired: bool,
    events: mpsc::UnboundedSender<EngineEvent>,
    snapshots: watch::Sender<TimerSnapshot>,
}

impl<S: HistoryStore> TimerEngine<S> {
    /// Wrap a machine. Events flow out through `events`; snapshots are
    /// published on a watch channel obtained via [`TimerEngine::subscribe`].
    pub fn new(machine: FastingStateMachine<S>, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        let (snapshots, _) = watch::channel(TimerSnapshot::NotStarted);
        Self {
            machine,
            last_announced_hour: 0,
            closing_soon_fired: false,
            window_closed_fired: false,
            events,
            snapshots,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn machine(&self) -> &FastingStateMachine<S> {
        &self.machine
    }

    /// Tear the engine down, handing the machine (and its store) back.
    pub fn into_machine(self) -> FastingStateMachine<S> {
        self.machine
    }

    pub fn phase(&self) -> FastingPhase {
        self.machine.phase()
    }

    /// Latest published snapshot; updated by every recompute pass.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fast now. An eating window still open from the previous
    /// cycle is closed first.
    pub fn start_fast(
        &mut self,
        protocol: FastingProtocol,
        custom_hours: u8,
        now: DateTime<Utc>,
    ) -> Result<TimerSnapshot, CoreError> {
        if self.machine.phase() == FastingPhase::Eating {
            let events = self.machine.end_eating_window(now)?;
            self.emit_all(events);
        }
        let events = match self.machine.start(protocol, custom_hours, now) {
            Ok(events) => events,
            Err(err) => return Err(self.refuse(err, now)),
        };
        self.emit_all(events);
        self.last_announced_hour = 0;
        self.closing_soon_fired = false;
        self.window_closed_fired = false;
        Ok(self.recompute(now))
    }

    /// Stop the current cycle before its natural end.
    ///
    /// Reconciles first, so a fast whose goal already passed completes
    /// (and is recorded) before the stop applies to the eating window.
    pub fn stop(
        &mut self,
        now: DateTime<Utc>,
        keep_record: bool,
    ) -> Result<TimerSnapshot, CoreError> {
        self.recompute(now);
        let events = match self.machine.stop_early(now, keep_record) {
            Ok(events) => events,
            Err(err) => return Err(self.refuse(err, now)),
        };
        self.emit_all(events);
        Ok(self.recompute(now))
    }

    /// Close the eating window and return to idle.
    pub fn end_eating(&mut self, now: DateTime<Utc>) -> Result<TimerSnapshot, CoreError> {
        self.recompute(now);
        let events = match self.machine.end_eating_window(now) {
            Ok(events) => events,
            Err(err) => return Err(self.refuse(err, now)),
        };
        self.emit_all(events);
        Ok(self.recompute(now))
    }

    // ── Recomputation ────────────────────────────────────────────────

    /// One full pass: derive the snapshot for `now`, applying any due
    /// transition and firing any due one-shot events, then publish it.
    pub fn recompute(&mut self, now: DateTime<Utc>) -> TimerSnapshot {
        let snapshot = match self.machine.phase() {
            FastingPhase::NotStarted => TimerSnapshot::NotStarted,
            FastingPhase::Fasting => self.fasting_tick(now),
            FastingPhase::Eating => self.eating_tick(now),
        };
        let _ = self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    /// Reconcile immediately after the host app returns to the
    /// foreground; does not wait for the next periodic tick.
    pub fn on_foreground(&mut self, now: DateTime<Utc>) -> TimerSnapshot {
        self.recompute(now)
    }

    /// Drive the loop once per second until `stop` flips to true or its
    /// sender is dropped. Cancellation takes effect at the tick boundary;
    /// no snapshot is published after it. To suspend while backgrounded,
    /// flip the signal, then call [`TimerEngine::on_foreground`] and run
    /// again on resume.
    pub async fn run(&mut self, mut stop: watch::Receiver<bool>) {
        let mut ticks = tokio::time::interval(TICK_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if *stop.borrow() {
                        break;
                    }
                    self.recompute(Utc::now());
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }
    }

    fn fasting_tick(&mut self, now: DateTime<Utc>) -> TimerSnapshot {
        let state = self.machine.state().clone();
        let Some(started) = state.fasting_started_at else {
            return TimerSnapshot::Error {
                reason: "fasting phase lost its start time".into(),
            };
        };

        let target = state.target();
        let elapsed = clamped_elapsed(started, now);

        if elapsed >= target {
            return match self.machine.complete_fast(now) {
                Ok(events) => {
                    self.emit_all(events);
                    self.closing_soon_fired = false;
                    self.window_closed_fired = false;
                    self.eating_tick(now)
                }
                Err(err) => {
                    warn!("goal-reached transition refused: {err}");
                    TimerSnapshot::Error {
                        reason: err.to_string(),
                    }
                }
            };
        }

        let elapsed_hours = u32::try_from(elapsed.num_hours()).unwrap_or(0);
        let current = milestones::current_for(elapsed_hours);
        // announce only when the elapsed hour lands exactly on a threshold
        // we have not passed before; late threshold crossings noticed after
        // the hour moved on are dropped, not replayed
        if elapsed_hours > self.last_announced_hour && current.hours == elapsed_hours {
            self.emit(EngineEvent::MilestoneReached {
                hours: current.hours,
                title: current.title.to_string(),
                at: now,
            });
            self.last_announced_hour = elapsed_hours;
        }

        TimerSnapshot::Fasting {
            protocol: state.protocol,
            started_at: started,
            target_hours: state.target_hours,
            elapsed_secs: elapsed.num_seconds(),
            remaining_secs: (target - elapsed).num_seconds(),
            progress: progress_ratio(elapsed, target),
            current_milestone: *current,
            next_milestone: milestones::next_after(elapsed_hours).copied(),
            at: now,
        }
    }

    fn eating_tick(&mut self, now: DateTime<Utc>) -> TimerSnapshot {
        let state = self.machine.state().clone();
        let (Some(eating_started), Some(fast_started)) =
            (state.eating_started_at, state.fasting_started_at)
        else {
            return TimerSnapshot::Error {
                reason: "eating phase lost its anchors".into(),
            };
        };

        let window = state.eating_window();
        let elapsed = clamped_elapsed(eating_started, now);
        let remaining = (window - elapsed).max(Duration::zero());

        if !self.closing_soon_fired
            && remaining > Duration::zero()
            && remaining <= Duration::hours(1)
        {
            self.emit(EngineEvent::EatingWindowClosingSoon {
                remaining_minutes: remaining.num_minutes(),
                at: now,
            });
            self.closing_soon_fired = true;
        }
        if !self.window_closed_fired && remaining == Duration::zero() {
            self.emit(EngineEvent::EatingWindowClosed { at: now });
            self.window_closed_fired = true;
        }

        TimerSnapshot::Eating {
            protocol: state.protocol,
            started_at: eating_started,
            window_hours: 24u8.saturating_sub(state.target_hours),
            elapsed_secs: elapsed.num_seconds(),
            remaining_secs: remaining.num_seconds(),
            progress: progress_ratio(elapsed, window),
            fast_started_at: fast_started,
            fasted_secs: clamped_elapsed(fast_started, eating_started).num_seconds(),
            at: now,
        }
    }

    // ── Event plumbing ───────────────────────────────────────────────

    fn emit(&self, event: EngineEvent) {
        // best effort; the host may not be listening
        let _ = self.events.send(event);
    }

    fn emit_all(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    fn refuse(&self, err: CoreError, now: DateTime<Utc>) -> CoreError {
        if let CoreError::Transition(t) = &err {
            self.emit(EngineEvent::TransitionRefused {
                reason: t.to_string(),
                at: now,
            });
        }
        err
    }
}

/// 0.0 ..= 1.0 progress of `elapsed` toward `total`.
fn progress_ratio(elapsed: Duration, total: Duration) -> f64 {
    let total_ms = total.num_milliseconds();
    if total_ms <= 0 {
        return 0.0;
    }
    (elapsed.num_milliseconds() as f64 / total_ms as f64).clamp(0.0, 1.0)
}
