//! Participant identity, snapshots, and transport events.
//!
//! The scheduler never creates or destroys participants. It keeps the most
//! recent snapshot the transport reported for each identifier so that roster
//! and promotion decisions can consult camera state and speaking history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque session identifier assigned by the media transport.
///
/// A blank identifier stands in for a missing reference and is treated as
/// absent by every roster operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap a transport session identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier carries no value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Snapshot of a participant as last reported by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub has_audio: bool,
    #[serde(default)]
    pub has_video: bool,
    /// Set only on confirmed vocal activity.
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_owner: bool,
}

impl Participant {
    /// A remote participant with audio and video off.
    #[must_use]
    pub fn remote(id: impl Into<ParticipantId>) -> Self {
        Self {
            id: id.into(),
            is_local: false,
            has_audio: false,
            has_video: false,
            last_active_at: None,
            is_owner: false,
        }
    }

    /// The local participant with audio and video off.
    #[must_use]
    pub fn local(id: impl Into<ParticipantId>) -> Self {
        Self {
            is_local: true,
            ..Self::remote(id)
        }
    }
}

/// Events consumed from the call-session layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticipantEvent {
    /// A participant joined the call.
    Joined { participant: Participant },

    /// A participant left. Unknown ids are ignored.
    Left { id: ParticipantId },

    /// The transport detected a new active speaker.
    ActiveSpeakerChanged {
        id: ParticipantId,
        #[serde(default = "Utc::now")]
        at: DateTime<Utc>,
    },

    /// A participant's media or role state changed.
    Updated { participant: Participant },
}

impl ParticipantEvent {
    /// Short label for logging and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            ParticipantEvent::Joined { .. } => "joined",
            ParticipantEvent::Left { .. } => "left",
            ParticipantEvent::ActiveSpeakerChanged { .. } => "active_speaker_changed",
            ParticipantEvent::Updated { .. } => "updated",
        }
    }
}

/// Latest known snapshot for every participant in the call.
#[derive(Debug, Clone, Default)]
pub struct ParticipantDirectory {
    participants: HashMap<ParticipantId, Participant>,
    local_id: Option<ParticipantId>,
}

impl ParticipantDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a snapshot, keeping any speaking history the
    /// transport omitted. The local participant stays local.
    pub fn upsert(&mut self, mut participant: Participant) {
        if participant.last_active_at.is_none() {
            participant.last_active_at = self
                .participants
                .get(&participant.id)
                .and_then(|p| p.last_active_at);
        }
        if self.local_id.as_ref() == Some(&participant.id) {
            participant.is_local = true;
        } else if participant.is_local {
            self.local_id = Some(participant.id.clone());
        }
        self.participants.insert(participant.id.clone(), participant);
    }

    /// Drop a snapshot. Returns the removed participant, if any.
    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        if self.local_id.as_ref() == Some(id) {
            self.local_id = None;
        }
        self.participants.remove(id)
    }

    /// Record confirmed vocal activity.
    pub fn mark_active(&mut self, id: &ParticipantId, at: DateTime<Utc>) {
        if let Some(participant) = self.participants.get_mut(id) {
            participant.last_active_at = Some(at);
        }
    }

    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    #[must_use]
    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    #[must_use]
    pub fn is_local(&self, id: &ParticipantId) -> bool {
        self.local_id.as_ref() == Some(id)
    }

    #[must_use]
    pub fn has_video(&self, id: &ParticipantId) -> bool {
        self.participants.get(id).is_some_and(|p| p.has_video)
    }

    #[must_use]
    pub fn last_active_at(&self, id: &ParticipantId) -> Option<DateTime<Utc>> {
        self.participants.get(id).and_then(|p| p.last_active_at)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_blank_ids() {
        assert!(ParticipantId::new("").is_blank());
        assert!(ParticipantId::new("  ").is_blank());
        assert!(!ParticipantId::new("p-1").is_blank());
    }

    #[test]
    fn test_upsert_preserves_speaking_history() {
        let mut directory = ParticipantDirectory::new();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        directory.upsert(Participant::remote("a"));
        directory.mark_active(&"a".into(), at);

        let mut update = Participant::remote("a");
        update.has_video = true;
        directory.upsert(update);

        assert_eq!(directory.last_active_at(&"a".into()), Some(at));
        assert!(directory.has_video(&"a".into()));
    }

    #[test]
    fn test_local_id_tracking() {
        let mut directory = ParticipantDirectory::new();
        directory.upsert(Participant::local("me"));
        directory.upsert(Participant::remote("a"));

        assert!(directory.is_local(&"me".into()));
        assert!(!directory.is_local(&"a".into()));

        directory.remove(&"me".into());
        assert!(directory.local_id().is_none());
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_update_keeps_local_participant_local() {
        let mut directory = ParticipantDirectory::new();
        directory.upsert(Participant::local("me"));

        let mut update = Participant::remote("me");
        update.has_video = true;
        directory.upsert(update);

        assert!(directory.is_local(&"me".into()));
        assert!(directory.get(&"me".into()).unwrap().is_local);
        assert!(directory.has_video(&"me".into()));
    }

    #[test]
    fn test_event_wire_format() {
        let json = r#"{"type":"joined","participant":{"id":"p-1","has_video":true}}"#;
        let event: ParticipantEvent = serde_json::from_str(json).unwrap();

        assert!(matches!(
            &event,
            ParticipantEvent::Joined { participant }
                if participant.id.as_str() == "p-1" && participant.has_video && !participant.is_local
        ));

        let left: ParticipantEvent = serde_json::from_str(r#"{"type":"left","id":"p-1"}"#).unwrap();
        assert_eq!(left.kind(), "left");
    }
}
