//! Debounce and throttle over a [`Scheduler`].
//!
//! The browser scheduler is `setTimeout` plus `performance.now`; tests drive
//! [`crate::testing::ManualScheduler`] by hand.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// Deferred execution on the event loop.
pub trait Scheduler {
    /// Milliseconds on a monotonic clock.
    fn now_ms(&self) -> f64;

    /// Run `task` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending task. Unknown or already-run ids are ignored.
    fn clear_timeout(&self, id: TimerId);
}

/// Collapses bursts of calls into one, run `delay_ms` after the last call.
pub struct Debounce {
    scheduler: Rc<dyn Scheduler>,
    delay_ms: u32,
    callback: Rc<dyn Fn()>,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl Debounce {
    /// Create a debouncer around `callback`.
    pub fn new(scheduler: Rc<dyn Scheduler>, delay_ms: u32, callback: Rc<dyn Fn()>) -> Self {
        Self {
            scheduler,
            delay_ms,
            callback,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// Request a run, restarting the quiet period.
    pub fn call(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
        }
        let pending = Rc::clone(&self.pending);
        let callback = Rc::clone(&self.callback);
        let id = self.scheduler.set_timeout(
            self.delay_ms,
            Box::new(move || {
                pending.set(None);
                callback();
            }),
        );
        self.pending.set(Some(id));
    }

    /// Run a pending call now instead of waiting.
    pub fn flush(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
            (self.callback)();
        }
    }

    /// Drop a pending call without running it.
    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
        }
    }

    /// Whether a call is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl fmt::Debug for Debounce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounce")
            .field("delay_ms", &self.delay_ms)
            .field("pending", &self.pending.get())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ThrottleState {
    last_run: Option<f64>,
    trailing: Option<TimerId>,
}

/// Runs at most once per `interval_ms`: immediately on the first call, and
/// once more at the end of the window if calls arrived during it.
pub struct Throttle {
    scheduler: Rc<dyn Scheduler>,
    interval_ms: u32,
    callback: Rc<dyn Fn()>,
    state: Rc<RefCell<ThrottleState>>,
}

impl Throttle {
    /// Create a throttle around `callback`.
    pub fn new(scheduler: Rc<dyn Scheduler>, interval_ms: u32, callback: Rc<dyn Fn()>) -> Self {
        Self {
            scheduler,
            interval_ms,
            callback,
            state: Rc::new(RefCell::new(ThrottleState::default())),
        }
    }

    /// Request a run.
    pub fn call(&self) {
        let now = self.scheduler.now_ms();
        let interval = f64::from(self.interval_ms);
        let mut state = self.state.borrow_mut();

        let elapsed = state.last_run.map(|last| now - last);
        if elapsed.map_or(true, |e| e >= interval) && state.trailing.is_none() {
            state.last_run = Some(now);
            drop(state);
            (self.callback)();
            return;
        }
        if state.trailing.is_some() {
            return;
        }

        let wait = (interval - elapsed.unwrap_or(0.0)).max(0.0).ceil() as u32;
        let shared = Rc::clone(&self.state);
        let callback = Rc::clone(&self.callback);
        let scheduler = Rc::clone(&self.scheduler);
        state.trailing = Some(self.scheduler.set_timeout(
            wait,
            Box::new(move || {
                {
                    let mut s = shared.borrow_mut();
                    s.trailing = None;
                    s.last_run = Some(scheduler.now_ms());
                }
                callback();
            }),
        ));
    }

    /// Drop a pending trailing run.
    pub fn cancel(&self) {
        if let Some(id) = self.state.borrow_mut().trailing.take() {
            self.scheduler.clear_timeout(id);
        }
    }
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval_ms", &self.interval_ms)
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualScheduler;

    fn counter() -> (Rc<Cell<u32>>, Rc<dyn Fn()>) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, Rc::new(move || c.set(c.get() + 1)))
    }

    #[test]
    fn test_debounce_collapses_burst() {
        let scheduler = Rc::new(ManualScheduler::new());
        let (count, cb) = counter();
        let debounce = Debounce::new(scheduler.clone(), 100, cb);

        debounce.call();
        scheduler.advance(50.0);
        debounce.call();
        scheduler.advance(50.0);
        debounce.call();
        assert_eq!(count.get(), 0);
        assert!(debounce.is_pending());

        scheduler.advance(100.0);
        assert_eq!(count.get(), 1);
        assert!(!debounce.is_pending());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_debounce_flush_and_cancel() {
        let scheduler = Rc::new(ManualScheduler::new());
        let (count, cb) = counter();
        let debounce = Debounce::new(scheduler.clone(), 100, cb);

        debounce.flush();
        assert_eq!(count.get(), 0);

        debounce.call();
        debounce.flush();
        assert_eq!(count.get(), 1);
        scheduler.advance(200.0);
        assert_eq!(count.get(), 1);

        debounce.call();
        debounce.cancel();
        scheduler.advance(200.0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_throttle_leading_and_trailing() {
        let scheduler = Rc::new(ManualScheduler::new());
        let (count, cb) = counter();
        let throttle = Throttle::new(scheduler.clone(), 100, cb);

        throttle.call();
        assert_eq!(count.get(), 1);
        scheduler.advance(10.0);
        throttle.call();
        throttle.call();
        assert_eq!(count.get(), 1);

        scheduler.advance(90.0);
        assert_eq!(count.get(), 2);

        // Window restarted at the trailing run
        scheduler.advance(50.0);
        throttle.call();
        assert_eq!(count.get(), 2);
        scheduler.advance(50.0);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_throttle_idle_call_runs_immediately() {
        let scheduler = Rc::new(ManualScheduler::new());
        let (count, cb) = counter();
        let throttle = Throttle::new(scheduler.clone(), 100, cb);
        throttle.call();
        scheduler.advance(150.0);
        throttle.call();
        assert_eq!(count.get(), 2);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_throttle_cancel() {
        let scheduler = Rc::new(ManualScheduler::new());
        let (count, cb) = counter();
        let throttle = Throttle::new(scheduler.clone(), 100, cb);
        throttle.call();
        throttle.call();
        throttle.cancel();
        scheduler.advance(500.0);
        assert_eq!(count.get(), 1);
    }
}
