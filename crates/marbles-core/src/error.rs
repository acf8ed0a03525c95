//! Error types for marbles-core.
//!
//! Only store construction can fail from the caller's point of view.
//! Runtime load and save failures are absorbed inside the settings store
//! (persistence is best-effort) and never cross the component boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up settings storage.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The per-user data directory could not be created.
    #[error("failed to create settings directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for SettingsError.
pub type Result<T, E = SettingsError> = std::result::Result<T, E>;
