//! Settings persistence with external-edit detection.
//!
//! The store owns the settings record for the process lifetime. All loads
//! funnel through one [`DelayedCall`] slot, so rapid triggers collapse into
//! a single read; the host pumps the slot from its periodic tick. A short
//! guard window keeps the store's own writes (and watcher bounce) from being
//! mistaken for external edits.
//!
//! Persistence is best-effort: a parse failure falls back to defaults, a
//! busy file is retried, a failed write is dropped. No failure crosses this
//! module's boundary.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use super::record::SettingsRecord;
use crate::delay::DelayedCall;
use crate::error::SettingsError;
use crate::events::{ObserverList, SubscriptionId};

/// Change signals arriving this soon after our own write are self-caused.
const SELF_WRITE_GUARD_MS: i64 = 100;
/// Reload delay after an external change, letting the writer finish flushing.
const EXTERNAL_CHANGE_DELAY_MS: i64 = 250;
/// Retry delay when the file is busy or locked.
const READ_RETRY_MS: i64 = 1000;
/// Default debounce for `queue_load`.
const DEFAULT_QUEUE_MS: i64 = 100;

/// File access the store needs. The real filesystem and the OS file watcher
/// live in the host; tests substitute in-memory or failing implementations.
pub trait SettingsFs {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<String>;
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// `std::fs`-backed implementation.
#[derive(Debug, Default)]
pub struct OsFs;

impl SettingsFs for OsFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Durable key-value store for user preferences.
pub struct SettingsStore {
    path: PathBuf,
    fs: Box<dyn SettingsFs>,
    record: SettingsRecord,
    /// Set when we write the file ourselves; change signals inside the guard
    /// window after this instant are ignored.
    ignore_changes_at: Option<DateTime<Utc>>,
    load_call: DelayedCall,
    observers: ObserverList<SettingsRecord>,
}

impl SettingsStore {
    /// Store over `settings.json` in the per-user data directory.
    pub fn open_default() -> Result<Self, SettingsError> {
        Ok(Self::new(
            super::data_dir()?.join("settings.json"),
            Box::new(OsFs),
        ))
    }

    pub fn new(path: PathBuf, fs: Box<dyn SettingsFs>) -> Self {
        Self {
            path,
            fs,
            record: SettingsRecord::default(),
            ignore_changes_at: None,
            load_call: DelayedCall::new(),
            observers: ObserverList::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &SettingsRecord {
        &self.record
    }

    /// Mutable access for the host. Call `save` afterwards to persist.
    pub fn record_mut(&mut self) -> &mut SettingsRecord {
        &mut self.record
    }

    /// Register a handler for the `loaded` notification. Fires on every
    /// successful (or defaulted) load with the resulting record.
    pub fn subscribe(&mut self, handler: impl FnMut(&SettingsRecord) + 'static) -> SubscriptionId {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Load or reload the settings from disk.
    ///
    /// A busy file re-queues itself after a backoff instead of failing; a
    /// malformed file silently becomes the defaults. A missing file is first
    /// run, so defaults are persisted immediately.
    pub fn load(&mut self, now: DateTime<Utc>) {
        if self.fs.exists(&self.path) {
            let text = match self.fs.read(&self.path) {
                Ok(text) => text,
                Err(_) => {
                    // IO error (like they are still writing the file).
                    // Wait and try again.
                    self.queue_load_after(now, READ_RETRY_MS);
                    return;
                }
            };

            // Permissive parse: comments and trailing commas are accepted
            // even though a save rewrites them away. Strictness here is only
            // annoying for whoever edits the file by hand.
            self.record = match json5::from_str(&text) {
                Ok(record) => record,
                Err(_) => SettingsRecord::default(),
            };
            self.record.sanitize();
        } else {
            // First run: persist defaults so the user has a file to edit.
            self.record = SettingsRecord::default();
            self.save(now);
        }

        let (observers, record) = (&mut self.observers, &self.record);
        observers.emit(record);
    }

    /// Write the record, pretty-printed for hand editing. Best effort: a
    /// failed write is dropped.
    pub fn save(&mut self, now: DateTime<Utc>) {
        let Ok(text) = serde_json::to_string_pretty(&self.record) else {
            return;
        };
        // Stamp before writing so the watcher's signal for this very write
        // lands inside the guard window.
        self.ignore_changes_at = Some(now);
        let _ = self.fs.write(&self.path, &text);
    }

    /// Queue a debounced reload after the default delay. A newer queue call
    /// supersedes a pending one, so only the most recent executes.
    pub fn queue_load(&mut self, now: DateTime<Utc>) {
        self.queue_load_after(now, DEFAULT_QUEUE_MS);
    }

    pub fn queue_load_after(&mut self, now: DateTime<Utc>, delay_ms: i64) {
        self.load_call
            .schedule(now, Duration::milliseconds(delay_ms));
    }

    /// External change signal, forwarded by the host's file watcher.
    ///
    /// Signals inside the guard window are our own write (or watcher bounce)
    /// and are dropped. Anything else schedules a reload after a short delay
    /// so the external writer can finish flushing.
    pub fn file_changed(&mut self, now: DateTime<Utc>) {
        if let Some(at) = self.ignore_changes_at {
            if now - at < Duration::milliseconds(SELF_WRITE_GUARD_MS) {
                return;
            }
        }
        self.ignore_changes_at = Some(now);
        self.queue_load_after(now, EXTERNAL_CHANGE_DELAY_MS);
    }

    /// Fire a due delayed load. Called from the host's periodic tick, which
    /// keeps loads on the same logical thread as every other store call.
    pub fn pump(&mut self, now: DateTime<Utc>) {
        if self.load_call.fire_due(now) {
            self.load(now);
        }
    }

    pub fn has_pending_load(&self) -> bool {
        self.load_call.is_pending()
    }
}
