//! Cancellation and interruptible pauses
//!
//! Controllers only suspend at remote calls and at the fixed delay of the
//! asynchronous-create lookup. Both points check a [`CancelToken`].

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Caller-supplied cancellation signal with an optional deadline.
///
/// Clones share the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also counts as cancelled once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::default(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Signal cancellation and wake any pending pause.
    pub fn cancel(&self) {
        let mut cancelled = match self.inner.cancelled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cancelled = true;
        self.inner.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        match self.inner.cancelled.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Block for `duration` or until cancelled, whichever comes first.
    ///
    /// Returns `false` if the wait ended because of cancellation.
    pub fn wait(&self, duration: Duration) -> bool {
        let mut until = Instant::now() + duration;
        if let Some(deadline) = self.deadline {
            until = until.min(deadline);
        }

        let mut cancelled = match self.inner.cancelled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        while !*cancelled {
            let now = Instant::now();
            if now >= until {
                break;
            }
            cancelled = match self.inner.wake.wait_timeout(cancelled, until - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        drop(cancelled);

        !self.is_cancelled()
    }
}

/// Source of the pause between lookup attempts.
///
/// Injected so tests can observe delays without waiting for them.
pub trait Sleeper: Send + Sync {
    /// Pause for `duration`. Returns `false` if cancelled meanwhile.
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool;
}

/// Real pause on the calling thread, woken early by cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> bool {
        cancel.wait(duration)
    }
}
