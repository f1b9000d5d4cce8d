//! Persistence seam consumed by the state machine and timer engine.

use crate::error::StorageError;
use crate::session::{FastingSession, PhaseState};
use crate::water::WaterState;

/// Durable storage for the phase state, the session history and the water
/// counter.
///
/// Corruption never surfaces through this trait: implementations recover
/// an unreadable phase state to [`PhaseState::default`], an unreadable
/// history to an empty list and an unreadable water blob to `None`,
/// logging what they dropped. Only genuine I/O failures return errors.
pub trait HistoryStore: Send {
    /// Load the persisted phase and anchors, or the idle default when
    /// nothing usable is stored.
    fn load_phase_state(&self) -> Result<PhaseState, StorageError>;

    /// Persist phase and anchors together, as one blob.
    fn save_phase_state(&self, state: &PhaseState) -> Result<(), StorageError>;

    /// All finished sessions, oldest first. Unreadable rows are skipped.
    fn load_sessions(&self) -> Result<Vec<FastingSession>, StorageError>;

    /// Append one finished session to the history.
    fn append_session(&self, session: &FastingSession) -> Result<(), StorageError>;

    /// Load the water counter, or `None` when nothing usable is stored.
    fn load_water_state(&self) -> Result<Option<WaterState>, StorageError>;

    fn save_water_state(&self, state: &WaterState) -> Result<(), StorageError>;
}
