//! Timer scheduling for per-call timeouts.
//!
//! Timeouts run through an injected scheduler rather than ad hoc per-call
//! threads, so tests can replace real time with a manual clock. Scheduled
//! tasks must tolerate firing after the call they guard has already
//! resolved: the registry's atomic removal makes the late firing a no-op.

use parking_lot::Mutex;
use std::time::Duration;

/// One-shot deferred task.
pub type TimerTask = Box<dyn FnOnce() + Send>;

/// Capability to run a task once a delay has elapsed.
pub trait TimerScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: TimerTask);
}

/// Scheduler backed by a tokio runtime.
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    /// Schedule timers on the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Schedule timers on the runtime the caller is running inside.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime context.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl TimerScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
    }
}

/// Manual clock for deterministic tests: nothing fires until the test
/// advances time.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    queue: Vec<(Duration, TimerTask)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `delta`, firing every task that has come due,
    /// earliest deadline first. Tasks run outside the internal lock so a
    /// task may schedule follow-up timers.
    pub fn advance(&self, delta: Duration) {
        let due: Vec<TimerTask> = {
            let mut state = self.state.lock();
            state.now += delta;
            let now = state.now;
            let mut due = Vec::new();
            let mut remaining = Vec::new();
            for (deadline, task) in state.queue.drain(..) {
                if deadline <= now {
                    due.push((deadline, task));
                } else {
                    remaining.push((deadline, task));
                }
            }
            state.queue = remaining;
            due.sort_by_key(|(deadline, _)| *deadline);
            due.into_iter().map(|(_, task)| task).collect()
        };
        for task in due {
            task();
        }
    }

    /// Number of tasks not yet due.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

impl TimerScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) {
        let mut state = self.state.lock();
        let deadline = state.now + delay;
        state.queue.push((deadline, task));
    }
}
