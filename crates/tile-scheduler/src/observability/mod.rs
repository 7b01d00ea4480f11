//! Observability for the Tile Scheduler.
//!
//! # Privacy by Default
//!
//! Participant identifiers appear only in debug-level tracing fields and
//! never as metric labels. Actor spans use `#[instrument(skip_all)]` with
//! explicit fields.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `ts_recomputations_total` | Counter | none | Settled recomputations |
//! | `ts_recompute_duration_seconds` | Histogram | none | Recompute cost |
//! | `ts_tier_changes_total` | Counter | `tier` | Subscription instructions sent |
//! | `ts_quality_instructions_total` | Counter | `quality` | Receive-quality instructions sent |
//! | `ts_transport_errors_total` | Counter | `operation` | Rejected instructions |
//! | `ts_promotions_total` | Counter | none | Active-speaker swaps |
//! | `ts_events_total` | Counter | `event` | Inbound events |
//! | `ts_subscribed_streams` | Gauge | none | Streams currently subscribed |
//! | `ts_roster_size` | Gauge | none | Participants in the roster |
//! | `ts_actor_mailbox_depth` | Gauge | none | Backpressure indicator |

pub mod metrics;

pub use metrics::{
    init_metrics_recorder, record_event, record_promotion, record_quality_instruction,
    record_recomputation, record_tier_change, record_transport_error, set_actor_mailbox_depth,
    set_roster_size, set_subscribed_streams,
};
