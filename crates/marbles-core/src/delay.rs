//! Delayed call slots with supersede-on-reschedule semantics.
//!
//! Each `schedule` bumps a generation counter and replaces whatever was
//! pending, so a superseded call can never fire. The owner drives delivery
//! by calling `fire_due` from its periodic tick, which keeps the callback on
//! the owning thread instead of some background timer thread.

use chrono::{DateTime, Duration, Utc};

/// One logical slot for a deferred action.
#[derive(Debug, Default)]
pub struct DelayedCall {
    serial: u64,
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    serial: u64,
    due: DateTime<Utc>,
}

impl DelayedCall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot to fire after `delay`. Replaces any pending call.
    pub fn schedule(&mut self, now: DateTime<Utc>, delay: Duration) {
        self.serial += 1;
        self.pending = Some(Pending {
            serial: self.serial,
            due: now + delay,
        });
    }

    /// Drop any pending call without firing it.
    pub fn cancel(&mut self) {
        self.serial += 1;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True once the scheduled instant has passed. Clears the slot, so each
    /// schedule fires at most once.
    pub fn fire_due(&mut self, now: DateTime<Utc>) -> bool {
        match &self.pending {
            Some(pending) if pending.serial == self.serial && now >= pending.due => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}
