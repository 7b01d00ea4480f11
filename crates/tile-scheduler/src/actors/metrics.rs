//! Mailbox monitoring for the scheduler actor.
//!
//! | Level | Depth |
//! |-------|-------|
//! | Normal | < 64 |
//! | Warning | 64-192 |
//! | Critical | > 192 |
//!
//! Viewport events arrive at input-device rates, so sustained depth above
//! normal means recomputation or the transport is too slow.

use crate::observability::metrics::set_actor_mailbox_depth;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Mailbox depth thresholds for the scheduler actor.
pub const SCHEDULER_MAILBOX_NORMAL: usize = 64;
pub const SCHEDULER_MAILBOX_WARNING: usize = 192;

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    /// Below normal threshold.
    Normal,
    /// Between normal and warning thresholds.
    Warning,
    /// Above warning threshold.
    Critical,
}

/// Tracks queue depth between the handles and the actor.
///
/// Handles record the enqueue after a successful send; the actor records the
/// dequeue when it takes a message.
#[derive(Debug)]
pub struct MailboxMonitor {
    actor_id: String,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record a message being added to the mailbox.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_depth.fetch_max(new_depth, Ordering::Relaxed);
        set_actor_mailbox_depth(new_depth);

        match Self::level_for_depth(new_depth) {
            MailboxLevel::Critical => warn!(
                target: "ts.actor.mailbox",
                actor_id = %self.actor_id,
                depth = new_depth,
                threshold = SCHEDULER_MAILBOX_WARNING,
                "Mailbox depth critical"
            ),
            // Log once when crossing into the warning band
            MailboxLevel::Warning if new_depth == SCHEDULER_MAILBOX_NORMAL + 1 => debug!(
                target: "ts.actor.mailbox",
                actor_id = %self.actor_id,
                depth = new_depth,
                "Mailbox depth elevated"
            ),
            _ => {}
        }
    }

    /// Record a message being taken off the mailbox.
    pub fn record_dequeue(&self) {
        let previous = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| Some(d.saturating_sub(1)))
            .unwrap_or_default();
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        set_actor_mailbox_depth(previous.saturating_sub(1));
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        Self::level_for_depth(self.current_depth())
    }

    fn level_for_depth(depth: usize) -> MailboxLevel {
        if depth > SCHEDULER_MAILBOX_WARNING {
            MailboxLevel::Critical
        } else if depth > SCHEDULER_MAILBOX_NORMAL {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}
