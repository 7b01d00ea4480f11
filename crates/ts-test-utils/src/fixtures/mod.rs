//! Pre-configured test data fixtures for scheduler testing.
//!
//! Provides builders for:
//! - Participants with camera, audio, and speaking history
//! - Calls (ordered join sequences plus a viewport)
//! - A spawned scheduler actor wired to a recording transport

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tile_scheduler::actors::{SchedulerActor, SchedulerActorHandle};
use tile_scheduler::config::{SchedulerSettings, ViewModeKind};
use tile_scheduler::participant::{Participant, ParticipantEvent, ParticipantId};
use tile_scheduler::state::{SchedulerEvent, SchedulerState, ViewportEvent};
use tile_scheduler::subscription::Budget;
use tile_scheduler::transport::mock::RecordingTransport;
use tile_scheduler::transport::MediaTransport;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Fixed reference time so speaking-history tests are reproducible.
#[must_use]
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Test participant fixture.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    participant: Participant,
}

impl TestParticipant {
    /// Create a remote participant with camera and microphone off.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            participant: Participant::remote(ParticipantId::new(id.into())),
        }
    }

    /// Create a remote participant with a random ID.
    #[must_use]
    pub fn random() -> Self {
        Self::new(format!("part-{}", Uuid::new_v4()))
    }

    /// Create the local participant.
    #[must_use]
    pub fn local(id: impl Into<String>) -> Self {
        let mut p = Self::new(id);
        p.participant.is_local = true;
        p
    }

    /// Turn the camera on.
    #[must_use]
    pub fn with_video(mut self) -> Self {
        self.participant.has_video = true;
        self
    }

    /// Turn the microphone on.
    #[must_use]
    pub fn with_audio(mut self) -> Self {
        self.participant.has_audio = true;
        self
    }

    /// Mark as meeting owner.
    #[must_use]
    pub fn owner(mut self) -> Self {
        self.participant.is_owner = true;
        self
    }

    /// Last spoke `seconds` after [`base_time`].
    #[must_use]
    pub fn spoke_at(mut self, seconds: i64) -> Self {
        self.participant.last_active_at = Some(base_time() + ChronoDuration::seconds(seconds));
        self
    }

    #[must_use]
    pub fn id(&self) -> &ParticipantId {
        &self.participant.id
    }

    #[must_use]
    pub fn build(self) -> Participant {
        self.participant
    }

    /// Join event for this participant.
    #[must_use]
    pub fn joined(self) -> ParticipantEvent {
        ParticipantEvent::Joined {
            participant: self.participant,
        }
    }
}

/// Test call fixture: a viewport plus an ordered sequence of events.
#[derive(Debug, Clone, Default)]
pub struct TestCall {
    events: Vec<SchedulerEvent>,
}

impl TestCall {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with small-call mode disabled, so tiers follow the window.
    #[must_use]
    pub fn settings() -> SchedulerSettings {
        SchedulerSettings {
            small_call_threshold: 0,
            ..SchedulerSettings::default()
        }
    }

    /// Settings whose paged grid holds exactly `page_size` 16:9 tiles in a
    /// single row of a `page_size * 320` by 180 viewport.
    #[must_use]
    pub fn settings_for_row(page_size: usize) -> SchedulerSettings {
        SchedulerSettings {
            min_tile_width: 320,
            max_tiles_per_page: page_size.max(1),
            small_call_threshold: 0,
            ..SchedulerSettings::default()
        }
    }

    /// Viewport for [`TestCall::settings_for_row`].
    #[must_use]
    pub fn with_row_viewport(self, page_size: usize) -> Self {
        let width = u32::try_from(page_size.max(1) * 320).unwrap();
        self.with_viewport(width, 180)
    }

    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.events
            .push(ViewportEvent::Resized { width, height }.into());
        self
    }

    #[must_use]
    pub fn with_local(self, id: &str) -> Self {
        self.with_participant(TestParticipant::local(id))
    }

    #[must_use]
    pub fn with_participant(mut self, participant: TestParticipant) -> Self {
        self.events.push(participant.joined().into());
        self
    }

    /// Add camera-off remote participants in order.
    #[must_use]
    pub fn with_remotes<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        for id in ids {
            self = self.with_participant(TestParticipant::new(id));
        }
        self
    }

    /// Add `count` remote participants named `p0`, `p1`, ...
    #[must_use]
    pub fn with_numbered_remotes(mut self, count: usize) -> Self {
        for i in 0..count {
            self = self.with_participant(TestParticipant::new(format!("p{i}")));
        }
        self
    }

    #[must_use]
    pub fn events(&self) -> &[SchedulerEvent] {
        &self.events
    }

    /// Apply every event to a fresh paged state.
    #[must_use]
    pub fn into_state(self, settings: SchedulerSettings) -> SchedulerState {
        let mut state = SchedulerState::new(settings, Budget::Unbounded, ViewModeKind::Paged);
        for event in self.events {
            state.apply(event);
        }
        state
    }
}

/// Spawned scheduler actor wired to a recording transport.
pub struct ActorHarness {
    pub handle: SchedulerActorHandle,
    pub task: JoinHandle<()>,
    pub transport: Arc<RecordingTransport>,
    pub cancel_token: CancellationToken,
}

impl ActorHarness {
    /// Default debounce used by the harness.
    pub const DEBOUNCE: Duration = Duration::from_millis(50);

    /// Spawn an actor owning `state`. Requires a tokio runtime.
    #[must_use]
    pub fn spawn(state: SchedulerState) -> Self {
        Self::spawn_with(state, Arc::new(RecordingTransport::new()))
    }

    /// Spawn with a specific transport (e.g. [`RecordingTransport::failing`]).
    #[must_use]
    pub fn spawn_with(state: SchedulerState, transport: Arc<RecordingTransport>) -> Self {
        let cancel_token = CancellationToken::new();
        let (handle, task) = SchedulerActor::spawn(
            "harness",
            state,
            Self::DEBOUNCE,
            Arc::clone(&transport) as Arc<dyn MediaTransport>,
            cancel_token.clone(),
        );
        Self {
            handle,
            task,
            transport,
            cancel_token,
        }
    }

    /// Wait until the actor has drained everything sent before this call.
    pub async fn sync(&self) {
        self.handle.snapshot().await.unwrap();
    }
}

/// Build a list of ids from string slices.
#[must_use]
pub fn ids(names: &[&str]) -> Vec<ParticipantId> {
    names.iter().map(|n| ParticipantId::new(*n)).collect()
}
