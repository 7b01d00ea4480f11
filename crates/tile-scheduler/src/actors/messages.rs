//! Message types for the scheduler actor.
//!
//! Callers talk to the actor over `tokio::sync::mpsc`; request-reply uses
//! `tokio::sync::oneshot`.

use crate::state::{Recomputation, SchedulerEvent, SchedulerSnapshot};
use tokio::sync::oneshot;

/// Messages sent to `SchedulerActor`.
#[derive(Debug)]
pub enum SchedulerMessage {
    /// Apply an event and (re)arm the debounce timer.
    Event(SchedulerEvent),

    /// Recompute immediately, bypassing the debounce timer.
    Flush {
        respond_to: oneshot::Sender<Recomputation>,
    },

    /// Read the current state without recomputing.
    GetSnapshot {
        respond_to: oneshot::Sender<SchedulerSnapshot>,
    },

    /// Cancel any pending recomputation and stop.
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

impl SchedulerMessage {
    /// Short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            SchedulerMessage::Event(_) => "event",
            SchedulerMessage::Flush { .. } => "flush",
            SchedulerMessage::GetSnapshot { .. } => "get_snapshot",
            SchedulerMessage::Shutdown { .. } => "shutdown",
        }
    }
}
