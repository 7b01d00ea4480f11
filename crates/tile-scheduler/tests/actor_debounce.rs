//! Scheduler actor behaviour under paused time.
//!
//! These tests drive a spawned actor through its handle and observe the
//! instructions that reach a recording transport.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use tile_scheduler::errors::SchedulerError;
use tile_scheduler::participant::ParticipantEvent;
use tile_scheduler::state::ViewportEvent;
use tile_scheduler::subscription::{Budget, Tier};
use tile_scheduler::transport::TransportInstruction;
use ts_test_utils::fixtures::{base_time, ids, ActorHarness, TestCall, TestParticipant};

fn five_remote_harness() -> ActorHarness {
    let state = TestCall::new()
        .with_row_viewport(2)
        .with_local("local")
        .with_remotes(["A", "B", "C", "D", "E"])
        .into_state(TestCall::settings_for_row(2));
    ActorHarness::spawn(state)
}

async fn sorted_subscriptions(harness: &ActorHarness) -> Vec<(String, Tier)> {
    let mut subs = harness.transport.subscriptions().await;
    subs.sort_by(|a, b| a.0.cmp(&b.0));
    subs
}

// ============================================================================
// Debounce
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_each_event_restarts_the_delay() {
    let harness = ActorHarness::spawn(
        TestCall::new()
            .with_row_viewport(2)
            .into_state(TestCall::settings_for_row(2)),
    );

    harness
        .handle
        .send_event(TestParticipant::new("a").joined())
        .await
        .unwrap();
    harness.sync().await;
    tokio::time::advance(Duration::from_millis(40)).await;
    harness.sync().await;

    harness
        .handle
        .send_event(TestParticipant::new("b").joined())
        .await
        .unwrap();
    harness.sync().await;
    tokio::time::advance(Duration::from_millis(40)).await;
    harness.sync().await;
    assert_eq!(harness.transport.call_count(), 0);

    tokio::time::advance(ActorHarness::DEBOUNCE).await;
    harness.sync().await;

    assert_eq!(
        sorted_subscriptions(&harness).await,
        [
            ("a".to_string(), Tier::Subscribed),
            ("b".to_string(), Tier::Subscribed)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_quiet_period_emits_nothing() {
    let harness = five_remote_harness();
    harness.handle.flush().await.unwrap();
    let first = harness.transport.call_count();

    tokio::time::advance(ActorHarness::DEBOUNCE * 10).await;
    harness.sync().await;

    assert_eq!(harness.transport.call_count(), first);
}

#[tokio::test(start_paused = true)]
async fn test_redundant_event_only_reissues_quality() {
    let harness = five_remote_harness();
    harness.handle.flush().await.unwrap();
    harness.transport.take().await;

    harness
        .handle
        .send_event(ViewportEvent::Resized {
            width: 640,
            height: 180,
        })
        .await
        .unwrap();
    tokio::time::advance(ActorHarness::DEBOUNCE).await;
    harness.sync().await;

    let instructions = harness.transport.take().await;
    assert_eq!(instructions.len(), 2);
    assert!(instructions
        .iter()
        .all(|i| matches!(i, TransportInstruction::SetReceiveQuality { .. })));
}

// ============================================================================
// Scheduling through the actor
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_page_change_reshuffles_tiers() {
    let harness = five_remote_harness();
    harness.handle.flush().await.unwrap();
    harness.transport.take().await;

    harness
        .handle
        .send_event(ViewportEvent::PageChanged { page: 2 })
        .await
        .unwrap();
    tokio::time::advance(ActorHarness::DEBOUNCE).await;
    harness.sync().await;

    assert_eq!(
        sorted_subscriptions(&harness).await,
        [
            ("A".to_string(), Tier::Staged),
            ("B".to_string(), Tier::Staged),
            ("C".to_string(), Tier::Subscribed),
            ("D".to_string(), Tier::Subscribed),
            ("E".to_string(), Tier::Staged),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_speaker_promotion_reaches_transport() {
    let harness = five_remote_harness();
    harness.handle.flush().await.unwrap();
    harness.transport.take().await;

    harness
        .handle
        .send_event(ParticipantEvent::ActiveSpeakerChanged {
            id: "E".into(),
            at: base_time(),
        })
        .await
        .unwrap();
    let result = harness.handle.flush().await.unwrap();

    assert_eq!(result.tier_changes.len(), 2);
    assert_eq!(
        sorted_subscriptions(&harness).await,
        [
            ("A".to_string(), Tier::Unsubscribed),
            ("E".to_string(), Tier::Subscribed)
        ]
    );

    let snapshot = harness.handle.snapshot().await.unwrap();
    let order: Vec<&str> = snapshot.roster.iter().map(|id| id.as_str()).collect();
    assert_eq!(order, ["local", "E", "B", "C", "D", "A"]);
    assert_eq!(snapshot.active_speaker.as_ref().map(|id| id.as_str()), Some("E"));
}

#[tokio::test(start_paused = true)]
async fn test_speaker_swapped_in_when_viewer_returns_to_first_page() {
    let harness = five_remote_harness();
    harness.handle.flush().await.unwrap();
    harness.transport.take().await;

    harness
        .handle
        .send_event(ViewportEvent::PageChanged { page: 2 })
        .await
        .unwrap();
    harness
        .handle
        .send_event(ParticipantEvent::ActiveSpeakerChanged {
            id: "E".into(),
            at: base_time(),
        })
        .await
        .unwrap();
    harness
        .handle
        .send_event(ViewportEvent::PageChanged { page: 1 })
        .await
        .unwrap();
    let result = harness.handle.flush().await.unwrap();

    let promotion = result.promotion.unwrap();
    assert_eq!(promotion.promoted.as_str(), "E");
    assert_eq!(promotion.demoted.as_str(), "A");
    assert_eq!(
        sorted_subscriptions(&harness).await,
        [
            ("A".to_string(), Tier::Unsubscribed),
            ("E".to_string(), Tier::Subscribed)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_host_controls_through_handle() {
    let harness = ActorHarness::spawn(
        TestCall::new()
            .with_row_viewport(2)
            .with_numbered_remotes(10)
            .into_state(TestCall::settings_for_row(2)),
    );

    harness.handle.set_budget(Budget::Limited(2)).await.unwrap();
    harness.handle.set_fixed(ids(&["p9"])).await.unwrap();
    let result = harness.handle.flush().await.unwrap();

    // Budget 2 with page size 2 leaves no room beyond the window.
    assert_eq!(result.window.visible.len(), 2);
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.tiers.count(Tier::Subscribed), 2);
    let staged: Vec<&str> = snapshot
        .tiers
        .ids_in(Tier::Staged)
        .into_iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(staged, ["p9"]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_parent_cancellation_stops_actor() {
    let harness = five_remote_harness();
    harness
        .handle
        .send_event(TestParticipant::new("late").joined())
        .await
        .unwrap();

    harness.cancel_token.cancel();
    harness.task.await.unwrap();

    assert_eq!(harness.transport.call_count(), 0);
    assert!(matches!(
        harness.handle.flush().await,
        Err(SchedulerError::ActorUnavailable(_))
    ));
}
