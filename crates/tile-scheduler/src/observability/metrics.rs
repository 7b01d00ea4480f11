//! Metrics definitions for the Tile Scheduler.
//!
//! All metrics follow Prometheus naming conventions:
//! - `ts_` prefix for Tile Scheduler
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded; participant identifiers are never used as labels:
//! - `tier`: 3 values (subscribed, staged, unsubscribed)
//! - `quality`: 3 values (low, mid, high)
//! - `operation`: 2 values (set_subscription, set_receive_quality)
//! - `event`: bounded by scheduler event kinds (~10 values)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;

/// Initialize the Prometheus metrics recorder.
///
/// With a bind address, an HTTP listener serving `/metrics` is started on
/// the current tokio runtime and no handle is returned. Without one, the
/// recorder is installed and the handle returned for on-demand rendering.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder(
    bind_address: Option<SocketAddr>,
) -> Result<Option<PrometheusHandle>, String> {
    let builder = PrometheusBuilder::new()
        // Recompute runs on the UI cadence; anything above one frame is slow.
        .set_buckets_for_metric(
            Matcher::Full("ts_recompute_duration_seconds".to_string()),
            &[
                0.000_1, 0.000_5, 0.001, 0.002_5, 0.005, 0.010, 0.016, 0.033, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set recompute duration buckets: {e}"))?;

    match bind_address {
        Some(addr) => builder
            .with_http_listener(addr)
            .install()
            .map(|()| None)
            .map_err(|e| format!("Failed to install Prometheus exporter on {addr}: {e}")),
        None => builder
            .install_recorder()
            .map(Some)
            .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}")),
    }
}

// ============================================================================
// Recompute Metrics
// ============================================================================

/// Record one settled recomputation.
///
/// Metrics: `ts_recomputations_total`, `ts_recompute_duration_seconds`
/// Labels: none
pub fn record_recomputation(duration: Duration) {
    counter!("ts_recomputations_total").increment(1);
    histogram!("ts_recompute_duration_seconds").record(duration.as_secs_f64());
}

/// Record a subscription instruction accepted by the transport.
///
/// Metric: `ts_tier_changes_total`
/// Labels: `tier`
pub fn record_tier_change(tier: &'static str) {
    counter!("ts_tier_changes_total", "tier" => tier).increment(1);
}

/// Record a receive-quality instruction accepted by the transport.
///
/// Metric: `ts_quality_instructions_total`
/// Labels: `quality`
pub fn record_quality_instruction(quality: &'static str) {
    counter!("ts_quality_instructions_total", "quality" => quality).increment(1);
}

/// Record an instruction the transport rejected.
///
/// Metric: `ts_transport_errors_total`
/// Labels: `operation`
///
/// Instructions are not retried; the next recomputation re-derives state.
pub fn record_transport_error(operation: &'static str) {
    counter!("ts_transport_errors_total", "operation" => operation).increment(1);
}

/// Record an active-speaker promotion (roster swap).
///
/// Metric: `ts_promotions_total`
/// Labels: none
pub fn record_promotion() {
    counter!("ts_promotions_total").increment(1);
}

/// Record an event received by the scheduler actor.
///
/// Metric: `ts_events_total`
/// Labels: `event`
pub fn record_event(event: &'static str) {
    counter!("ts_events_total", "event" => event).increment(1);
}

// ============================================================================
// State Gauges
// ============================================================================

/// Set the number of subscribed video streams.
///
/// Metric: `ts_subscribed_streams`
/// Labels: none
pub fn set_subscribed_streams(count: usize) {
    // usize to f64 conversion is safe for realistic call sizes (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("ts_subscribed_streams").set(count as f64);
}

/// Set the number of participants in the roster (local included).
///
/// Metric: `ts_roster_size`
/// Labels: none
pub fn set_roster_size(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("ts_roster_size").set(count as f64);
}

/// Set the scheduler actor mailbox depth.
///
/// Metric: `ts_actor_mailbox_depth`
/// Labels: none
///
/// Used for backpressure monitoring. High values indicate the actor is
/// falling behind the event stream.
pub fn set_actor_mailbox_depth(depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("ts_actor_mailbox_depth").set(depth as f64);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    // These tests execute the recording functions against whatever recorder
    // is installed (the no-op recorder by default).

    #[test]
    fn test_record_recomputation() {
        record_recomputation(Duration::from_micros(80));
        record_recomputation(Duration::from_millis(3));
    }

    #[test]
    fn test_bounded_labels() {
        for tier in ["subscribed", "staged", "unsubscribed"] {
            record_tier_change(tier);
        }
        for quality in ["low", "mid", "high"] {
            record_quality_instruction(quality);
        }
        for operation in ["set_subscription", "set_receive_quality"] {
            record_transport_error(operation);
        }
    }

    #[test]
    fn test_gauges() {
        set_subscribed_streams(0);
        set_subscribed_streams(36);
        set_roster_size(1000);
        set_actor_mailbox_depth(12);
    }

    #[test]
    fn test_metrics_captured_by_debugging_recorder() {
        use metrics_util::debugging::DebuggingRecorder;

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        // Global state: this is the only test that installs a recorder.
        let _ = recorder.install();

        record_recomputation(Duration::from_millis(1));
        record_tier_change("subscribed");
        record_quality_instruction("high");
        record_transport_error("set_subscription");
        record_promotion();
        record_event("joined");
        set_subscribed_streams(4);
        set_roster_size(9);

        let names: Vec<String> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .map(|(key, _, _, _)| key.key().name().to_string())
            .collect();

        for expected in [
            "ts_recomputations_total",
            "ts_recompute_duration_seconds",
            "ts_tier_changes_total",
            "ts_quality_instructions_total",
            "ts_transport_errors_total",
            "ts_promotions_total",
            "ts_subscribed_streams",
            "ts_roster_size",
        ] {
            assert!(
                names.iter().any(|n| n == expected),
                "missing metric {expected}, got {names:?}"
            );
        }
    }
}
