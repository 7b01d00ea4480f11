//! Subscription scheduler.
//!
//! Partitions remote participants into three tiers under a budget on
//! concurrently subscribed video streams:
//!
//! | Tier | Meaning |
//! |------|---------|
//! | `Subscribed` | On screen (or the active speaker); media flowing |
//! | `Staged` | Buffered just off screen; track negotiated, media paused |
//! | `Unsubscribed` | Far from the viewport; nothing negotiated |
//!
//! Recomputation is idempotent: the same inputs always produce the same map,
//! and diffing against the previous map yields only real tier changes.

use crate::participant::ParticipantId;
use crate::window::VisibleWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// Subscription priority for one remote participant's video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Subscribed,
    Staged,
    Unsubscribed,
}

impl Tier {
    /// Returns the tier as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Subscribed => "subscribed",
            Tier::Staged => "staged",
            Tier::Unsubscribed => "unsubscribed",
        }
    }
}

/// Maximum number of concurrently subscribed streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    /// No explicit cap; three pages' worth of subscriptions.
    #[default]
    Unbounded,
    /// Explicit cap, raised to one full page when smaller.
    Limited(usize),
}

impl Budget {
    /// Effective subscription cap for the given page size.
    #[must_use]
    pub fn max_subscriptions(&self, page_size: usize) -> usize {
        match self {
            Budget::Unbounded => page_size.saturating_mul(3),
            Budget::Limited(budget) => (*budget).max(page_size),
        }
    }
}

/// Desired tier per remote participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierMap(BTreeMap<ParticipantId, Tier>);

impl TierMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<Tier> {
        self.0.get(id).copied()
    }

    pub fn insert(&mut self, id: ParticipantId, tier: Tier) {
        self.0.insert(id, tier);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of participants in a tier.
    #[must_use]
    pub fn count(&self, tier: Tier) -> usize {
        self.0.values().filter(|t| **t == tier).count()
    }

    /// Participants in a tier, ordered by identifier.
    #[must_use]
    pub fn ids_in(&self, tier: Tier) -> Vec<&ParticipantId> {
        self.0
            .iter()
            .filter(|(_, t)| **t == tier)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, Tier)> {
        self.0.iter().map(|(id, tier)| (id, *tier))
    }
}

/// One instruction for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierChange {
    pub id: ParticipantId,
    /// Tier previously requested, if any.
    pub from: Option<Tier>,
    pub to: Tier,
}

/// Inputs to one recomputation.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionInput<'a> {
    /// Remote roster order; the local participant is never included.
    pub remote_ids: &'a [ParticipantId],
    pub window: &'a VisibleWindow,
    pub active_speaker: Option<&'a ParticipantId>,
    /// Pinned or presenter ids that always stay at least staged.
    pub fixed_ids: &'a [ParticipantId],
    pub budget: Budget,
    /// Calls with fewer remote participants never unsubscribe anyone.
    pub small_call_threshold: usize,
}

/// Index range of participants kept rendered or buffered around the window.
fn buffered_range(window: &VisibleWindow, total: usize, max_subs: usize) -> Range<usize> {
    let page_size = window.page_size.max(1);
    let edge_run = max_subs.min(page_size.saturating_mul(2)).min(total);

    if window.is_first_page() {
        0..edge_run
    } else if window.is_last_page() {
        total - edge_run..total
    } else {
        let side = max_subs.saturating_sub(page_size) / 2;
        window.start.saturating_sub(side)..window.end.saturating_add(side).min(total)
    }
}

/// Compute the desired tier for every remote participant.
#[must_use]
pub fn desired_tiers(input: &SubscriptionInput<'_>) -> TierMap {
    let total = input.remote_ids.len();
    let mut tiers = TierMap::new();
    if total == 0 {
        return tiers;
    }

    let max_subs = input.budget.max_subscriptions(input.window.page_size.max(1));
    let small_call = total < input.small_call_threshold;
    let buffered = if small_call {
        0..total
    } else {
        buffered_range(input.window, total, max_subs)
    };
    let visible = input.window.start.min(total)..input.window.end.min(total);

    let speaker = input
        .active_speaker
        .filter(|id| input.remote_ids.contains(id));

    for (index, id) in input.remote_ids.iter().enumerate() {
        let tier = if visible.contains(&index) || speaker == Some(id) {
            Tier::Subscribed
        } else if buffered.contains(&index) || input.fixed_ids.contains(id) {
            Tier::Staged
        } else {
            Tier::Unsubscribed
        };
        tiers.insert(id.clone(), tier);
    }

    // An off-screen speaker must not push the subscribed count over budget:
    // it displaces the last visible tile instead.
    if let Some(speaker) = speaker {
        let speaker_visible = input
            .remote_ids
            .iter()
            .position(|id| id == speaker)
            .is_some_and(|index| visible.contains(&index));
        if !speaker_visible && tiers.count(Tier::Subscribed) > max_subs {
            let on_screen = input.remote_ids.get(visible.clone()).unwrap_or_default();
            let displaced = on_screen
                .iter()
                .rev()
                .find(|id| *id != speaker && !input.fixed_ids.contains(id))
                .or_else(|| on_screen.iter().rev().find(|id| *id != speaker));
            if let Some(displaced) = displaced {
                tiers.insert(displaced.clone(), Tier::Staged);
            }
        }
    }

    debug!(
        target: "ts.subscription",
        total,
        max_subs,
        small_call,
        subscribed = tiers.count(Tier::Subscribed),
        staged = tiers.count(Tier::Staged),
        "Computed desired tiers"
    );

    tiers
}

/// Instructions needed to move from `previous` to `next`.
///
/// Participants absent from `next` have left the call and need no
/// instruction.
#[must_use]
pub fn diff(previous: &TierMap, next: &TierMap) -> Vec<TierChange> {
    next.iter()
        .filter_map(|(id, to)| {
            let from = previous.get(id);
            (from != Some(to)).then(|| TierChange {
                id: id.clone(),
                from,
                to,
            })
        })
        .collect()
}

/// Recompute tiers and the changes relative to the previous map.
#[must_use]
pub fn recompute(input: &SubscriptionInput<'_>, previous: &TierMap) -> (TierMap, Vec<TierChange>) {
    let next = desired_tiers(input);
    let changes = diff(previous, &next);
    (next, changes)
}
