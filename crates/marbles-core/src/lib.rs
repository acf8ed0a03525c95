//! # Marbles Core Library
//!
//! This library provides the core logic for Marbles, a sprint ("deep work")
//! timer that alternates a work interval with a rest interval. The desktop
//! shell is a thin layer over this crate: it polls [`SprintEngine::status`]
//! on a fixed cadence (250 ms in the reference host) and owns a single
//! [`SettingsStore`] for the process lifetime.
//!
//! ## Architecture
//!
//! - **Sprint Engine**: a wall-clock state machine. Phase is derived from
//!   elapsed time on every query, never stored, so irregular polling or a
//!   suspend/resume gap cannot drift the countdown.
//! - **Settings Store**: best-effort JSON persistence of user preferences,
//!   with debouncing of external file-change signals against the store's
//!   own writes.
//! - **Observers**: components expose explicit `subscribe`/`unsubscribe`
//!   lists ([`ObserverList`]); there is no global event bus.
//! - **Delayed calls**: [`DelayedCall`] slots where a newer schedule
//!   supersedes the pending one, pumped by the host's periodic tick.
//!
//! All time-dependent operations take `now` explicitly, which keeps the
//! whole crate deterministic under test.

pub mod delay;
pub mod error;
pub mod events;
pub mod settings;
pub mod sprint;

pub use delay::DelayedCall;
pub use error::SettingsError;
pub use events::{ObserverList, SubscriptionId};
pub use settings::{SettingsRecord, SettingsStore};
pub use sprint::{Phase, SprintEngine, SprintEvent, StatusSnapshot};
