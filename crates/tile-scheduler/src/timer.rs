//! Cancellable debounce timer.
//!
//! Owned by the scheduler actor and polled from its `select!` loop. Each
//! call to [`DebounceTimer::schedule`] replaces any pending deadline, so a
//! burst of triggers settles into a single firing `delay` after the last one.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm the timer, replacing any pending deadline.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Disarm the timer. Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolves at the pending deadline; never resolves while disarmed.
    ///
    /// Does not disarm the timer. Callers cancel it once they act on the
    /// firing.
    pub async fn fired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
