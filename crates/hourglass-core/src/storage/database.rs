//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Finished fasting sessions
//! - The phase state and water counter (key-value blobs)
//!
//! Corrupt blobs and unreadable rows are logged and dropped rather than
//! surfaced; the caller always gets something usable back.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::warn;
use uuid::Uuid;

use crate::error::StorageError;
use crate::schedule::FastingProtocol;
use crate::session::{FastingSession, PhaseState};
use crate::water::WaterState;

use super::data_dir;
use super::store::HistoryStore;

const PHASE_STATE_KEY: &str = "phase_state";
const WATER_STATE_KEY: &str = "water_state";

/// SQLite database holding the session history and engine state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/hourglass/hourglass.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("hourglass.db");
        Self::open_at(&path)
    }

    /// Open (and migrate) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database, for tests and ephemeral runs.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS fasting_sessions (
                id           TEXT PRIMARY KEY,
                protocol     TEXT NOT NULL,
                target_hours INTEGER NOT NULL,
                started_at   TEXT NOT NULL,
                ended_at     TEXT,
                completed    INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Index for history scans in start order
            CREATE INDEX IF NOT EXISTS idx_fasting_sessions_started_at
                ON fasting_sessions(started_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Rebuild a session from its row parts, or `None` when any part is
/// unreadable.
fn parse_session_row(
    id: &str,
    protocol: &str,
    target_hours: i64,
    started_at: &str,
    ended_at: Option<&str>,
    completed: i64,
) -> Option<FastingSession> {
    Some(FastingSession {
        id: Uuid::parse_str(id).ok()?,
        protocol: FastingProtocol::from_token(protocol)?,
        target_hours: u8::try_from(target_hours).ok()?,
        started_at: parse_timestamp(started_at)?,
        ended_at: match ended_at {
            Some(raw) => Some(parse_timestamp(raw)?),
            None => None,
        },
        completed: completed != 0,
    })
}

impl HistoryStore for Database {
    fn load_phase_state(&self) -> Result<PhaseState, StorageError> {
        match self.kv_get(PHASE_STATE_KEY)? {
            Some(json) => match serde_json::from_str::<PhaseState>(&json) {
                Ok(state) => Ok(state.sanitized()),
                Err(e) => {
                    warn!("discarding corrupt phase state: {e}");
                    Ok(PhaseState::default())
                }
            },
            None => Ok(PhaseState::default()),
        }
    }

    fn save_phase_state(&self, state: &PhaseState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state)?;
        self.kv_set(PHASE_STATE_KEY, &json)
    }

    fn load_sessions(&self) -> Result<Vec<FastingSession>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, protocol, target_hours, started_at, ended_at, completed
             FROM fasting_sessions
             ORDER BY started_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, protocol, target_hours, started_at, ended_at, completed) = match row {
                Ok(parts) => parts,
                Err(e) => {
                    warn!("skipping unreadable session row: {e}");
                    continue;
                }
            };
            match parse_session_row(
                &id,
                &protocol,
                target_hours,
                &started_at,
                ended_at.as_deref(),
                completed,
            ) {
                Some(session) => sessions.push(session),
                None => warn!("skipping corrupt session row {id}"),
            }
        }
        Ok(sessions)
    }

    fn append_session(&self, session: &FastingSession) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO fasting_sessions
                (id, protocol, target_hours, started_at, ended_at, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id.to_string(),
                session.protocol.as_token(),
                i64::from(session.target_hours),
                session.started_at.to_rfc3339(),
                session.ended_at.map(|t| t.to_rfc3339()),
                i64::from(session.completed),
            ],
        )?;
        Ok(())
    }

    fn load_water_state(&self) -> Result<Option<WaterState>, StorageError> {
        match self.kv_get(WATER_STATE_KEY)? {
            Some(json) => match serde_json::from_str::<WaterState>(&json) {
                Ok(state) => Ok(Some(state)),
                Err(e) => {
                    warn!("discarding corrupt water state: {e}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn save_water_state(&self, state: &WaterState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state)?;
        self.kv_set(WATER_STATE_KEY, &json)
    }
}
