mod config;
pub mod database;
pub mod store;

pub use config::Config;
pub use database::Database;
pub use store::HistoryStore;

use std::path::PathBuf;

/// Returns `~/.config/hourglass[-dev]/` based on HOURGLASS_ENV.
///
/// Set HOURGLASS_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HOURGLASS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("hourglass-dev")
    } else {
        base_dir.join("hourglass")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
