mod record;
mod store;

pub use record::SettingsRecord;
pub use store::{OsFs, SettingsFs, SettingsStore};

use std::path::PathBuf;

use crate::error::SettingsError;

/// Returns `~/.config/marbles[-dev]/`, creating it if needed.
///
/// Set MARBLES_ENV=dev to use the development data directory, or
/// MARBLES_DATA_DIR to point somewhere else entirely (used by tests).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, SettingsError> {
    let dir = if let Ok(dir) = std::env::var("MARBLES_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("MARBLES_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("marbles-dev")
        } else {
            base_dir.join("marbles")
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| SettingsError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
