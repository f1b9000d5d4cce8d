//! The fasting phase state machine.
//!
//! Owns the persisted [`PhaseState`] and applies the legal transitions:
//!
//! ```text
//! NotStarted ── start ──> Fasting ── complete_fast ──> Eating
//!     ^                      │                           │
//!     ├───── stop_early ─────┘                           │
//!     └── end_eating_window / stop_early ────────────────┘
//! ```
//!
//! Every operation takes the current wall-clock time as a parameter, so
//! callers and tests control the clock. Phase and anchors are written to
//! the store as one blob; finished fasts are appended to the history at
//! the moment the phase leaves `Fasting`.
//!
//! Storage writes are optimistic: a failed write is logged and surfaced,
//! but the in-memory transition stands so a flaky disk cannot wedge the
//! cycle.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, StorageError, TransitionError};
use crate::events::EngineEvent;
use crate::schedule::FastingProtocol;
use crate::session::{clamped_elapsed, FastingPhase, FastingSession, PhaseState};
use crate::storage::HistoryStore;

pub struct FastingStateMachine<S: HistoryStore> {
    state: PhaseState,
    store: S,
}

impl<S: HistoryStore> FastingStateMachine<S> {
    /// Build a machine from whatever the store holds. Corrupt or
    /// inconsistent stored state has already been recovered to the idle
    /// default by the store.
    pub fn load(store: S) -> Result<Self, StorageError> {
        let state = store.load_phase_state()?;
        Ok(Self { state, store })
    }

    pub fn state(&self) -> &PhaseState {
        &self.state
    }

    pub fn phase(&self) -> FastingPhase {
        self.state.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Finished sessions, oldest first.
    pub fn sessions(&self) -> Result<Vec<FastingSession>, StorageError> {
        self.store.load_sessions()
    }

    /// Begin a fast. Legal only from `NotStarted`.
    ///
    /// The protocol is resolved against `custom_hours` here; later edits
    /// to the preference do not move a goal already in flight.
    pub fn start(
        &mut self,
        protocol: FastingProtocol,
        custom_hours: u8,
        now: DateTime<Utc>,
    ) -> Result<Vec<EngineEvent>, CoreError> {
        if self.state.phase != FastingPhase::NotStarted {
            return Err(TransitionError {
                from: self.state.phase,
                operation: "start a fast",
            }
            .into());
        }

        self.state = PhaseState {
            phase: FastingPhase::Fasting,
            fasting_started_at: Some(now),
            eating_started_at: None,
            protocol,
            target_hours: protocol.fasting_hours(custom_hours),
        };
        self.commit(None)?;
        Ok(vec![EngineEvent::HapticPulse { at: now }])
    }

    /// Roll a fast that reached its goal into the eating window, recording
    /// the completed session.
    ///
    /// Called from the tick path, so it is idempotent: a duplicate call
    /// while already `Eating` is a silent no-op, and storage failures are
    /// logged rather than returned. Calling from `NotStarted` is still a
    /// caller bug and errors.
    pub fn complete_fast(&mut self, now: DateTime<Utc>) -> Result<Vec<EngineEvent>, TransitionError> {
        match self.state.phase {
            FastingPhase::Eating => return Ok(Vec::new()),
            FastingPhase::NotStarted => {
                return Err(TransitionError {
                    from: self.state.phase,
                    operation: "complete a fast",
                })
            }
            FastingPhase::Fasting => {}
        }
        let Some(started) = self.state.fasting_started_at else {
            return Err(TransitionError {
                from: self.state.phase,
                operation: "complete a fast",
            });
        };

        let fasted = clamped_elapsed(started, now);
        let ended = started + fasted;
        let session = FastingSession {
            id: Uuid::new_v4(),
            protocol: self.state.protocol,
            target_hours: self.state.target_hours,
            started_at: started,
            ended_at: Some(ended),
            completed: true,
        };

        self.state.phase = FastingPhase::Eating;
        self.state.eating_started_at = Some(ended);
        // tick path: errors were logged inside commit, the loop carries on
        let _ = self.commit(Some(&session));

        Ok(vec![
            EngineEvent::FastCompleted {
                target_hours: self.state.target_hours,
                fasted_secs: fasted.num_seconds(),
                at: now,
            },
            EngineEvent::HapticPulse { at: now },
        ])
    }

    /// Abandon the cycle before its natural end. Legal from `Fasting` and
    /// `Eating`.
    ///
    /// Stopping during `Fasting` with `keep_record` appends an uncompleted
    /// session; without it the attempt vanishes. Stopping during `Eating`
    /// never writes a record, because the completed fast was already
    /// recorded when the eating window opened.
    pub fn stop_early(
        &mut self,
        now: DateTime<Utc>,
        keep_record: bool,
    ) -> Result<Vec<EngineEvent>, CoreError> {
        let session = match self.state.phase {
            FastingPhase::NotStarted => {
                return Err(TransitionError {
                    from: self.state.phase,
                    operation: "stop a fast",
                }
                .into())
            }
            FastingPhase::Fasting => {
                if keep_record {
                    self.state.fasting_started_at.map(|started| {
                        let fasted = clamped_elapsed(started, now);
                        FastingSession {
                            id: Uuid::new_v4(),
                            protocol: self.state.protocol,
                            target_hours: self.state.target_hours,
                            started_at: started,
                            ended_at: Some(started + fasted),
                            completed: false,
                        }
                    })
                } else {
                    None
                }
            }
            FastingPhase::Eating => None,
        };

        self.reset_to_idle();
        self.commit(session.as_ref())?;
        Ok(vec![EngineEvent::HapticPulse { at: now }])
    }

    /// Close the eating window and return to idle. Legal only from
    /// `Eating`; the window may be ended early or long after it elapsed.
    pub fn end_eating_window(&mut self, now: DateTime<Utc>) -> Result<Vec<EngineEvent>, CoreError> {
        if self.state.phase != FastingPhase::Eating {
            return Err(TransitionError {
                from: self.state.phase,
                operation: "end the eating window",
            }
            .into());
        }

        self.reset_to_idle();
        self.commit(None)?;
        Ok(vec![EngineEvent::HapticPulse { at: now }])
    }

    /// Back to `NotStarted`, keeping the protocol choice for the next run.
    fn reset_to_idle(&mut self) {
        self.state.phase = FastingPhase::NotStarted;
        self.state.fasting_started_at = None;
        self.state.eating_started_at = None;
    }

    /// Write the session record (if any) and the phase state. Both writes
    /// are attempted even when the first fails; the first error wins.
    fn commit(&self, session: Option<&FastingSession>) -> Result<(), StorageError> {
        let mut first_error = None;
        if let Some(session) = session {
            if let Err(e) = self.store.append_session(session) {
                warn!("failed to append session record: {e}");
                first_error = Some(e);
            }
        }
        if let Err(e) = self.store.save_phase_state(&self.state) {
            warn!("failed to persist phase state: {e}");
            first_error.get_or_insert(e);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn machine() -> FastingStateMachine<Database> {
        FastingStateMachine::load(Database::open_memory().unwrap()).unwrap()
    }

    #[test]
    fn full_cycle_records_a_completed_session() {
        let mut m = machine();

        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();
        assert_eq!(m.phase(), FastingPhase::Fasting);
        assert_eq!(m.state().fasting_started_at, Some(t0()));
        assert_eq!(m.state().target_hours, 16);

        let events = m.complete_fast(t0() + Duration::hours(16)).unwrap();
        assert_eq!(m.phase(), FastingPhase::Eating);
        assert_eq!(m.state().eating_started_at, Some(t0() + Duration::hours(16)));
        assert!(matches!(
            events[0],
            EngineEvent::FastCompleted { target_hours: 16, fasted_secs, .. }
                if fasted_secs == 16 * 3600
        ));

        m.end_eating_window(t0() + Duration::hours(20)).unwrap();
        assert_eq!(m.phase(), FastingPhase::NotStarted);

        let sessions = m.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed);
        assert_eq!(sessions[0].target_hours, 16);
        assert_eq!(sessions[0].started_at, t0());
        assert_eq!(sessions[0].ended_at, Some(t0() + Duration::hours(16)));
    }

    #[test]
    fn start_is_illegal_while_a_cycle_is_active() {
        let mut m = machine();
        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();

        let err = m
            .start(FastingProtocol::Warrior, 16, t0() + Duration::hours(1))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Transition(TransitionError { from: FastingPhase::Fasting, .. })
        ));
        // refused operations leave the state untouched
        assert_eq!(m.state().protocol, FastingProtocol::SixteenEight);
        assert_eq!(m.state().fasting_started_at, Some(t0()));
    }

    #[test]
    fn complete_fast_is_idempotent_once_eating() {
        let mut m = machine();
        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();
        m.complete_fast(t0() + Duration::hours(16)).unwrap();

        let events = m.complete_fast(t0() + Duration::hours(16) + Duration::seconds(1)).unwrap();
        assert!(events.is_empty());
        assert_eq!(m.sessions().unwrap().len(), 1);
    }

    #[test]
    fn complete_fast_from_idle_is_a_caller_bug() {
        let mut m = machine();
        let err = m.complete_fast(t0()).unwrap_err();
        assert_eq!(err.from, FastingPhase::NotStarted);
    }

    #[test]
    fn stop_early_keeping_the_record_appends_an_uncompleted_session() {
        let mut m = machine();
        m.start(FastingProtocol::EighteenSix, 16, t0()).unwrap();
        m.stop_early(t0() + Duration::hours(5), true).unwrap();

        assert_eq!(m.phase(), FastingPhase::NotStarted);
        let sessions = m.sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].completed);
        assert_eq!(sessions[0].ended_at, Some(t0() + Duration::hours(5)));
        assert_eq!(sessions[0].target_hours, 18);
    }

    #[test]
    fn stop_early_discarding_leaves_no_trace() {
        let mut m = machine();
        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();
        m.stop_early(t0() + Duration::hours(5), false).unwrap();

        assert_eq!(m.phase(), FastingPhase::NotStarted);
        assert!(m.sessions().unwrap().is_empty());
    }

    #[test]
    fn stop_early_during_eating_adds_no_second_record() {
        let mut m = machine();
        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();
        m.complete_fast(t0() + Duration::hours(16)).unwrap();
        m.stop_early(t0() + Duration::hours(17), true).unwrap();

        assert_eq!(m.phase(), FastingPhase::NotStarted);
        assert_eq!(m.sessions().unwrap().len(), 1);
        assert!(m.sessions().unwrap()[0].completed);
    }

    #[test]
    fn stop_early_from_idle_is_refused() {
        let mut m = machine();
        assert!(m.stop_early(t0(), true).is_err());
    }

    #[test]
    fn end_eating_window_is_only_legal_while_eating() {
        let mut m = machine();
        assert!(m.end_eating_window(t0()).is_err());

        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();
        assert!(m.end_eating_window(t0() + Duration::hours(1)).is_err());
        assert_eq!(m.phase(), FastingPhase::Fasting);
    }

    #[test]
    fn custom_protocol_resolves_its_target_at_start() {
        let mut m = machine();
        m.start(FastingProtocol::Custom, 0, t0()).unwrap();
        // out-of-range preference clamps instead of failing
        assert_eq!(m.state().target_hours, 1);
    }

    #[test]
    fn clock_going_backwards_clamps_the_recorded_fast() {
        let mut m = machine();
        m.start(FastingProtocol::SixteenEight, 16, t0()).unwrap();
        m.stop_early(t0() - Duration::hours(2), true).unwrap();

        let sessions = m.sessions().unwrap();
        assert_eq!(sessions[0].ended_at, Some(t0()));
    }

    #[test]
    fn state_survives_a_reload_from_the_same_store() {
        let mut m = machine();
        m.start(FastingProtocol::Warrior, 16, t0()).unwrap();

        let store = m.into_store();
        let reloaded = FastingStateMachine::load(store).unwrap();
        assert_eq!(reloaded.phase(), FastingPhase::Fasting);
        assert_eq!(reloaded.state().protocol, FastingProtocol::Warrior);
        assert_eq!(reloaded.state().target_hours, 20);
        assert_eq!(reloaded.state().fasting_started_at, Some(t0()));
    }

    #[test]
    fn protocol_choice_survives_the_cycle() {
        let mut m = machine();
        m.start(FastingProtocol::Warrior, 16, t0()).unwrap();
        m.stop_early(t0() + Duration::hours(1), false).unwrap();
        assert_eq!(m.state().protocol, FastingProtocol::Warrior);
    }
}
