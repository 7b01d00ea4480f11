//! Tile Scheduler Library
//!
//! Media-track subscription and adaptive layout scheduling for video-call
//! front-ends. Given a viewport, a participant roster, and an active-speaker
//! signal, the scheduler decides:
//!
//! - how to lay out a variable number of tiles in the viewport,
//! - which remote participants' video is subscribed, staged (negotiated but
//!   paused), or unsubscribed under a cap on concurrent streams,
//! - which simulcast quality layer to request for what is on screen,
//! - when to swap the current speaker into the visible window.
//!
//! # Architecture
//!
//! ```text
//! viewport events ──┐
//! participant events ├─► SchedulerActor ──debounce──► SchedulerState::recompute
//! host controls ─────┘        │                           │
//!                             │        ┌──────────────────┴──────────────┐
//!                             │        layout  window  subscription  quality
//!                             ▼                           │
//!                      watch<SchedulerSnapshot>            ▼
//!                                                   MediaTransport
//! ```
//!
//! The pure modules ([`layout`], [`roster`], [`window`], [`subscription`],
//! [`promoter`], [`quality`]) hold no shared state and can be used directly.
//! [`state`] composes them; [`actors`] serializes access and debounces.
//!
//! # Modules
//!
//! - [`actors`] - Scheduler actor, handle, and mailbox monitoring
//! - [`config`] - Configuration from environment
//! - [`errors`] - Error types
//! - [`observability`] - Prometheus metrics
//! - [`transport`] - Outbound media transport trait and implementations

pub mod actors;
pub mod config;
pub mod errors;
pub mod layout;
pub mod observability;
pub mod participant;
pub mod promoter;
pub mod quality;
pub mod roster;
pub mod state;
pub mod subscription;
pub mod timer;
pub mod transport;
pub mod window;
