//! # TS Test Utilities
//!
//! Shared test utilities for the Tile Scheduler.
//!
//! ## Modules
//!
//! - `fixtures` - Participant builders, call builders, and actor harnesses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ts_test_utils::fixtures::*;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_example() {
//!     let call = TestCall::new()
//!         .with_local("me")
//!         .with_remotes(["a", "b", "c"])
//!         .with_viewport(1280, 720);
//!
//!     let harness = ActorHarness::spawn(call.into_state(TestCall::settings()));
//!     harness.handle.flush().await.unwrap();
//!     assert_eq!(harness.transport.subscriptions().await.len(), 3);
//! }
//! ```

pub mod fixtures;

pub use tile_scheduler::transport::mock::RecordingTransport;
