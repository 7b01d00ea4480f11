//! Active-speaker promoter.
//!
//! Keeps the person currently talking on screen without reshuffling the
//! grid: an off-screen speaker trades places with the visible participant
//! who has been quiet the longest. Only a pairwise swap is ever performed.

use crate::participant::{ParticipantDirectory, ParticipantId};
use crate::roster::Roster;
use crate::window::VisibleWindow;
use serde::Serialize;
use tracing::debug;

/// A swap performed to bring the active speaker on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Promotion {
    /// Active speaker moved into the window.
    pub promoted: ParticipantId,
    /// Least recently active visible participant moved out.
    pub demoted: ParticipantId,
}

/// Decide which visible participant the speaker should replace.
///
/// Returns `None` when the speaker is local, unknown, already visible, when
/// the viewer has navigated away from the first page, or when nobody remote
/// is visible.
#[must_use]
pub fn select_swap(
    roster: &Roster,
    window: &VisibleWindow,
    directory: &ParticipantDirectory,
    speaker: &ParticipantId,
) -> Option<Promotion> {
    if speaker.is_blank() || directory.is_local(speaker) || !roster.contains(speaker) {
        return None;
    }
    if !window.is_first_page() {
        return None;
    }

    let remote = roster.remote_ids(directory.local_id());
    let visible = remote.get(window.start..window.end.min(remote.len()))?;
    if visible.is_empty() || visible.contains(speaker) {
        return None;
    }

    // `None` sorts before any timestamp; ties keep the earliest roster slot.
    let demoted = visible
        .iter()
        .min_by_key(|id| directory.last_active_at(id))?
        .clone();

    Some(Promotion {
        promoted: speaker.clone(),
        demoted,
    })
}

/// Swap the active speaker into the visible window if needed.
pub fn promote(
    roster: &mut Roster,
    window: &VisibleWindow,
    directory: &ParticipantDirectory,
    speaker: &ParticipantId,
) -> Option<Promotion> {
    let promotion = select_swap(roster, window, directory, speaker)?;
    if !roster.swap(&promotion.demoted, &promotion.promoted) {
        return None;
    }
    debug!(
        target: "ts.promoter",
        promoted = %promotion.promoted,
        demoted = %promotion.demoted,
        "Promoted active speaker into view"
    );
    Some(promotion)
}
