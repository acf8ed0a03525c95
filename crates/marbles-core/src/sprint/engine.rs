//! Sprint timer state machine.
//!
//! The engine is wall-clock based and holds no internal threads. It stores
//! only the instant a run started and derives the current phase on every
//! `status` call, so the caller may poll at any cadence (the reference host
//! uses 250 ms) and a missed tick or a suspend/resume gap cannot drift the
//! countdown.
//!
//! ## Phases
//!
//! ```text
//! Idle -> Working -> Resting -> Elapsed
//!                 \-> Elapsed        (zero rest duration)
//! ```
//!
//! `Elapsed` is open-ended; `seconds_remaining` keeps counting into the
//! negative until the run is cancelled or replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{ObserverList, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No run in progress, or the run was cancelled.
    Idle,
    /// In the sprint (deep work) segment.
    Working,
    /// In the rest segment.
    Resting,
    /// Past both segments. Does not expire.
    Elapsed,
}

/// Notifications emitted by the engine.
///
/// `Started` fires synchronously from `start`. `Completed` fires exactly once
/// per run, from the first `status` call that observes the sprint segment
/// finished -- this covers a zero rest duration, where the phase jumps from
/// `Working` straight to `Elapsed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SprintEvent {
    Started {
        sprint_seconds: f64,
        rest_seconds: f64,
        at: DateTime<Utc>,
    },
    Completed {
        at: DateTime<Utc>,
    },
}

/// Returned by `status`. Derived from the run and `now`; nothing here is
/// stored between calls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub phase: Phase,
    /// Seconds until the next phase boundary. Starts at the segment length
    /// and goes negative once in `Elapsed`.
    pub seconds_remaining: f64,
    /// Seconds into the current phase. Restarts at 0 on each phase shift.
    pub seconds_into_phase: f64,
    /// Seconds since the run started, after time scaling.
    pub total_elapsed_seconds: f64,
    pub sprint_seconds: f64,
    pub rest_seconds: f64,
}

impl StatusSnapshot {
    fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            seconds_remaining: 0.0,
            seconds_into_phase: 0.0,
            total_elapsed_seconds: 0.0,
            sprint_seconds: 0.0,
            rest_seconds: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    started_at: DateTime<Utc>,
    sprint_seconds: f64,
    rest_seconds: f64,
    completed_fired: bool,
}

/// Core sprint engine. One instance per host; not meant for shared
/// multi-thread mutation.
pub struct SprintEngine {
    run: Option<Run>,
    /// Multiplier applied to elapsed time. For speeding things up to try out
    /// the system; stays 1.0 in normal use.
    time_scale: f64,
    observers: ObserverList<SprintEvent>,
}

impl SprintEngine {
    pub fn new() -> Self {
        Self {
            run: None,
            time_scale: 1.0,
            observers: ObserverList::new(),
        }
    }

    pub fn set_time_scale(&mut self, scale: f64) {
        self.time_scale = scale;
    }

    /// Register a handler for `Started`/`Completed` notifications.
    pub fn subscribe(&mut self, handler: impl FnMut(&SprintEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Start a new run, replacing any run in progress.
    ///
    /// Inputs are assumed validated by the caller (sprint > 0, rest >= 0);
    /// the host rejects bad user input before it gets here.
    pub fn start(&mut self, sprint_seconds: f64, rest_seconds: f64, now: DateTime<Utc>) {
        self.run = Some(Run {
            started_at: now,
            sprint_seconds,
            rest_seconds,
            completed_fired: false,
        });
        self.observers.emit(&SprintEvent::Started {
            sprint_seconds,
            rest_seconds,
            at: now,
        });
    }

    /// Start only if no run is in progress (`Idle` or `Elapsed`). Returns
    /// whether a run began. This is the guard that keeps a stray start from
    /// clobbering an active run.
    pub fn try_start(&mut self, sprint_seconds: f64, rest_seconds: f64, now: DateTime<Utc>) -> bool {
        match self.phase_at(now) {
            Phase::Idle | Phase::Elapsed => {
                self.start(sprint_seconds, rest_seconds, now);
                true
            }
            Phase::Working | Phase::Resting => false,
        }
    }

    /// Cancel a running sprint. No-op when idle; never emits `Completed`.
    pub fn cancel(&mut self) {
        self.run = None;
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    /// Current phase without the completion side effect of `status`.
    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        let Some(run) = &self.run else {
            return Phase::Idle;
        };
        let elapsed = self.scaled_elapsed(run, now);
        if elapsed < run.sprint_seconds {
            Phase::Working
        } else if elapsed < run.sprint_seconds + run.rest_seconds {
            Phase::Resting
        } else {
            Phase::Elapsed
        }
    }

    /// Compute the current status. Called periodically by the host.
    ///
    /// The only side effect is the one-shot `Completed` notification, fired
    /// the first time the sprint segment is observed finished.
    pub fn status(&mut self, now: DateTime<Utc>) -> StatusSnapshot {
        let Some(run) = self.run else {
            return StatusSnapshot::idle();
        };

        let elapsed = self.scaled_elapsed(&run, now);
        let full_span = run.sprint_seconds + run.rest_seconds;

        if elapsed < run.sprint_seconds {
            StatusSnapshot {
                phase: Phase::Working,
                seconds_remaining: run.sprint_seconds - elapsed,
                seconds_into_phase: elapsed,
                total_elapsed_seconds: elapsed,
                sprint_seconds: run.sprint_seconds,
                rest_seconds: run.rest_seconds,
            }
        } else if elapsed < full_span {
            self.fire_completed(now);
            StatusSnapshot {
                phase: Phase::Resting,
                seconds_remaining: full_span - elapsed,
                seconds_into_phase: elapsed - run.sprint_seconds,
                total_elapsed_seconds: elapsed,
                sprint_seconds: run.sprint_seconds,
                rest_seconds: run.rest_seconds,
            }
        } else {
            // Fired here as well, so a zero rest duration still completes.
            self.fire_completed(now);
            StatusSnapshot {
                phase: Phase::Elapsed,
                seconds_remaining: full_span - elapsed,
                seconds_into_phase: elapsed - full_span,
                total_elapsed_seconds: elapsed,
                sprint_seconds: run.sprint_seconds,
                rest_seconds: run.rest_seconds,
            }
        }
    }

    fn fire_completed(&mut self, now: DateTime<Utc>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if run.completed_fired {
            return;
        }
        run.completed_fired = true;
        self.observers.emit(&SprintEvent::Completed { at: now });
    }

    fn scaled_elapsed(&self, run: &Run, now: DateTime<Utc>) -> f64 {
        (now - run.started_at).num_milliseconds() as f64 / 1000.0 * self.time_scale
    }
}

impl Default for SprintEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;
    use std::rc::Rc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 9, 0, 0).unwrap()
    }

    fn after(seconds: f64) -> DateTime<Utc> {
        t0() + Duration::milliseconds((seconds * 1000.0) as i64)
    }

    fn completion_counter(engine: &mut SprintEngine) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        engine.subscribe(move |event| {
            if matches!(event, SprintEvent::Completed { .. }) {
                handle.set(handle.get() + 1);
            }
        });
        count
    }

    #[test]
    fn idle_before_any_start() {
        let mut engine = SprintEngine::new();
        let status = engine.status(t0());
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(status.seconds_remaining, 0.0);
        assert_eq!(status.total_elapsed_seconds, 0.0);
    }

    #[test]
    fn working_phase_counts_down() {
        let mut engine = SprintEngine::new();
        engine.start(1500.0, 300.0, t0());

        let status = engine.status(after(600.0));
        assert_eq!(status.phase, Phase::Working);
        assert_eq!(status.seconds_remaining, 900.0);
        assert_eq!(status.seconds_into_phase, 600.0);
        assert_eq!(status.total_elapsed_seconds, 600.0);
        assert_eq!(status.sprint_seconds, 1500.0);
        assert_eq!(status.rest_seconds, 300.0);
    }

    #[test]
    fn resting_phase_fires_completed_once() {
        let mut engine = SprintEngine::new();
        let completions = completion_counter(&mut engine);
        engine.start(1500.0, 300.0, t0());

        let status = engine.status(after(1500.0));
        assert_eq!(status.phase, Phase::Resting);
        assert_eq!(status.seconds_into_phase, 0.0);
        assert_eq!(status.seconds_remaining, 300.0);
        assert_eq!(completions.get(), 1);

        // Repeated polling does not re-fire.
        engine.status(after(1600.0));
        engine.status(after(1700.0));
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn elapsed_phase_goes_negative() {
        let mut engine = SprintEngine::new();
        let completions = completion_counter(&mut engine);
        engine.start(1500.0, 300.0, t0());

        let status = engine.status(after(1900.0));
        assert_eq!(status.phase, Phase::Elapsed);
        assert_eq!(status.seconds_remaining, -100.0);
        assert_eq!(status.seconds_into_phase, 100.0);
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn zero_rest_skips_resting_but_still_completes() {
        let mut engine = SprintEngine::new();
        let completions = completion_counter(&mut engine);
        engine.start(1500.0, 0.0, t0());

        assert_eq!(engine.status(after(1499.0)).phase, Phase::Working);
        let status = engine.status(after(1500.0));
        assert_eq!(status.phase, Phase::Elapsed);
        assert_eq!(completions.get(), 1);

        engine.status(after(5000.0));
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn cancel_returns_to_idle_without_completing() {
        let mut engine = SprintEngine::new();
        let completions = completion_counter(&mut engine);
        engine.start(10.0, 5.0, t0());
        engine.cancel();

        // Well past every boundary, still idle and never completed.
        let status = engine.status(after(1000.0));
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(completions.get(), 0);

        // Cancelling again is a no-op.
        engine.cancel();
        assert!(!engine.is_active());
    }

    #[test]
    fn try_start_refuses_while_running() {
        let mut engine = SprintEngine::new();
        engine.start(1500.0, 300.0, t0());

        assert!(!engine.try_start(60.0, 30.0, after(100.0))); // Working
        assert!(!engine.try_start(60.0, 30.0, after(1600.0))); // Resting

        // Original run still intact.
        assert_eq!(engine.status(after(100.0)).sprint_seconds, 1500.0);
    }

    #[test]
    fn try_start_succeeds_when_idle_or_elapsed() {
        let mut engine = SprintEngine::new();
        assert!(engine.try_start(1500.0, 300.0, t0()));

        // Past sprint + rest: Elapsed, so a new run may begin.
        assert!(engine.try_start(60.0, 30.0, after(1800.0)));
        let status = engine.status(after(1801.0));
        assert_eq!(status.phase, Phase::Working);
        assert_eq!(status.sprint_seconds, 60.0);
    }

    #[test]
    fn new_start_resets_completion_flag() {
        let mut engine = SprintEngine::new();
        let completions = completion_counter(&mut engine);

        engine.start(100.0, 0.0, t0());
        engine.status(after(100.0));
        assert_eq!(completions.get(), 1);

        engine.start(100.0, 0.0, after(200.0));
        engine.status(after(300.0));
        assert_eq!(completions.get(), 2);
    }

    #[test]
    fn started_event_carries_durations() {
        let mut engine = SprintEngine::new();
        let seen = Rc::new(Cell::new((0.0, 0.0)));
        let handle = Rc::clone(&seen);
        engine.subscribe(move |event| {
            if let SprintEvent::Started {
                sprint_seconds,
                rest_seconds,
                ..
            } = event
            {
                handle.set((*sprint_seconds, *rest_seconds));
            }
        });

        engine.start(1500.0, 300.0, t0());
        assert_eq!(seen.get(), (1500.0, 300.0));
    }

    #[test]
    fn time_scale_accelerates_elapsed_time() {
        let mut engine = SprintEngine::new();
        engine.set_time_scale(60.0);
        engine.start(1500.0, 300.0, t0());

        // 25 wall seconds at 60x = 1500 scaled seconds.
        let status = engine.status(after(25.0));
        assert_eq!(status.phase, Phase::Resting);
        assert_eq!(status.total_elapsed_seconds, 1500.0);
    }

    #[test]
    fn unsubscribed_handler_misses_later_events() {
        let mut engine = SprintEngine::new();
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        let id = engine.subscribe(move |_| handle.set(handle.get() + 1));

        engine.start(10.0, 0.0, t0());
        assert_eq!(count.get(), 1);

        assert!(engine.unsubscribe(id));
        engine.status(after(10.0)); // Completed fires, nobody listening.
        assert_eq!(count.get(), 1);
    }
}
