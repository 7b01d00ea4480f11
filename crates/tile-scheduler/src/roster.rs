//! Roster manager.
//!
//! The roster is the ordered list of participant identifiers used for
//! layout and paging. Positions are stable: participants keep their slot
//! until they leave or are explicitly swapped.
//!
//! Join, leave and reorder requests can arrive interleaved from several
//! sources (transport callbacks, local UI, remote broadcasts). Every
//! operation is therefore a silent no-op on invalid input instead of an
//! error.

use crate::participant::{Participant, ParticipantDirectory, ParticipantId};
use std::collections::HashMap;
use tracing::debug;

/// Ordered, duplicate-free list of participant identifiers.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    order: Vec<ParticipantId>,
    positions: HashMap<ParticipantId, usize>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from identifiers, skipping blanks and duplicates.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ParticipantId>,
    {
        let mut roster = Self::new();
        for id in ids {
            roster.append(id.into());
        }
        roster
    }

    /// Add an identifier at the end unless it is already present.
    pub fn append(&mut self, id: ParticipantId) {
        if id.is_blank() || self.positions.contains_key(&id) {
            return;
        }
        self.positions.insert(id.clone(), self.order.len());
        self.order.push(id);
    }

    /// Remove an identifier. Absent identifiers are ignored.
    pub fn remove(&mut self, id: &ParticipantId) {
        let Some(index) = self.positions.remove(id) else {
            return;
        };
        if index < self.order.len() {
            self.order.remove(index);
            self.reindex_from(index);
        }
    }

    /// Exchange the positions of two identifiers in place.
    ///
    /// No-op when the identifiers are equal, blank, or either is missing.
    /// Returns whether the roster changed.
    pub fn swap(&mut self, a: &ParticipantId, b: &ParticipantId) -> bool {
        if a == b || a.is_blank() || b.is_blank() {
            return false;
        }
        let (Some(&ia), Some(&ib)) = (self.positions.get(a), self.positions.get(b)) else {
            debug!(target: "ts.roster", a = %a, b = %b, "Swap skipped, participant missing");
            return false;
        };
        if ia >= self.order.len() || ib >= self.order.len() {
            return false;
        }
        self.order.swap(ia, ib);
        self.positions.insert(a.clone(), ib);
        self.positions.insert(b.clone(), ia);
        true
    }

    /// Place a joining participant.
    ///
    /// A participant with camera on goes immediately before the first
    /// remote, camera-off participant that is not the active speaker, so
    /// live tiles stay ahead of idle ones. Otherwise it is appended.
    pub fn insert_before_first_inactive_cam_off(
        &mut self,
        joining: &Participant,
        directory: &ParticipantDirectory,
        active_speaker: Option<&ParticipantId>,
    ) {
        let id = &joining.id;
        if id.is_blank() || self.positions.contains_key(id) {
            return;
        }

        let slot = if joining.has_video {
            self.order.iter().position(|existing| {
                !directory.is_local(existing)
                    && active_speaker != Some(existing)
                    && !directory.has_video(existing)
            })
        } else {
            None
        };

        match slot {
            Some(index) => {
                self.order.insert(index, id.clone());
                self.reindex_from(index);
            }
            None => self.append(id.clone()),
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (index, id) in self.order.iter().enumerate().skip(start) {
            self.positions.insert(id.clone(), index);
        }
    }

    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.positions.contains_key(id)
    }

    #[must_use]
    pub fn position(&self, id: &ParticipantId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All identifiers in roster order.
    #[must_use]
    pub fn ids(&self) -> &[ParticipantId] {
        &self.order
    }

    /// Identifiers in roster order, excluding the local participant.
    #[must_use]
    pub fn remote_ids(&self, local: Option<&ParticipantId>) -> Vec<ParticipantId> {
        self.order
            .iter()
            .filter(|id| Some(*id) != local)
            .cloned()
            .collect()
    }
}
