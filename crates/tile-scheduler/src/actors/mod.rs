//! Actor implementation for the Tile Scheduler.
//!
//! ```text
//! SchedulerActorHandle (cloneable, held by event sources)
//! └── SchedulerActor (one per call view)
//!     ├── owns SchedulerState
//!     ├── owns the debounce timer
//!     └── pushes instructions to a MediaTransport
//! ```
//!
//! The actor is the only writer of scheduler state, so triggers from
//! transport callbacks, viewport observers, and host controls never race.
//! Settled snapshots are published on a `watch` channel for renderers.

pub mod messages;
pub mod metrics;
pub mod scheduler;

pub use messages::SchedulerMessage;
pub use metrics::{MailboxLevel, MailboxMonitor};
pub use scheduler::{SchedulerActor, SchedulerActorHandle};
