//! Deadline timers driven by an explicit clock
//!
//! Nothing here sleeps. The owner of a timer passes the current `Instant`
//! to `poll`, which makes the same code usable from a tokio loop and from
//! deterministic tests.

use std::time::{Duration, Instant};

/// A single-slot timer carrying a payload.
///
/// Arming replaces any pending deadline, so at most one deadline is ever
/// live.
#[derive(Debug, Clone)]
pub struct Timer<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Timer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer to fire `delay` after `now`, cancelling any pending deadline.
    pub fn arm(&mut self, now: Instant, delay: Duration, payload: T) {
        self.pending = Some((now + delay, payload));
    }

    /// Cancel the pending deadline, returning its payload.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    /// Fire the timer if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((deadline, _)) if deadline <= now => self.cancel(),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn payload(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, payload)| payload)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

/// Coalesces bursts of triggers into a single action.
///
/// `schedule` is called on every incremental event and pushes the action
/// back; `run_now_unless_already_fired` is called when the gesture ends so
/// the final state is reflected without waiting, but without firing twice.
/// The scheduler only decides *when*; the owner runs the action whenever a
/// method returns `true`.
#[derive(Debug, Clone, Default)]
pub struct DebounceScheduler {
    timer: Timer<()>,
    fired: bool,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.fired = false;
        self.timer.arm(now, delay, ());
    }

    /// Returns `true` when the scheduled deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.timer.poll(now).is_some() {
            self.fired = true;
            true
        } else {
            false
        }
    }

    /// Cancels the pending deadline and returns `true` unless the action
    /// already fired since the last `schedule`.
    pub fn run_now_unless_already_fired(&mut self) -> bool {
        self.timer.cancel();
        if self.fired {
            false
        } else {
            self.fired = true;
            true
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }
}
