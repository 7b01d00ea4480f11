//! Scheduler state.
//!
//! `SchedulerState` is the single owner of everything the scheduler knows:
//! the roster, participant snapshots, viewport, view position, active
//! speaker, pinned ids, budget, and the last tier map sent to the transport.
//! Events mutate it immediately; [`SchedulerState::recompute`] derives the
//! instructions for the current state in one pass.

use crate::config::{Config, SchedulerSettings, ViewModeKind};
use crate::layout::{self, TileGeometry};
use crate::participant::{ParticipantDirectory, ParticipantEvent, ParticipantId};
use crate::promoter::{self, Promotion};
use crate::quality::{self, QualityInstruction};
use crate::roster::Roster;
use crate::subscription::{self, Budget, SubscriptionInput, TierChange, TierMap};
use crate::window::{self, ViewMode, WindowLayout};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Events from the presentation layer describing the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewportEvent {
    /// Grid container resized, in pixels.
    Resized { width: u32, height: u32 },
    /// Scroll offset changed (scroll mode only).
    Scrolled { scroll_top: f64 },
    /// Page navigation, one-based (paged mode only).
    PageChanged { page: usize },
}

/// Host-driven changes to scheduling policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEvent {
    /// `None` restores the default of three pages' worth.
    SetBudget { budget: Option<usize> },
    /// Replace the pinned or presenter ids.
    SetFixed { ids: Vec<ParticipantId> },
    /// Switch strategy; the position resets to the top.
    SetViewMode { mode: ViewModeKind },
}

/// Every input the scheduler accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchedulerEvent {
    Participant(ParticipantEvent),
    Viewport(ViewportEvent),
    Control(ControlEvent),
}

impl SchedulerEvent {
    /// Short label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            SchedulerEvent::Participant(event) => event.kind(),
            SchedulerEvent::Viewport(ViewportEvent::Resized { .. }) => "resized",
            SchedulerEvent::Viewport(ViewportEvent::Scrolled { .. }) => "scrolled",
            SchedulerEvent::Viewport(ViewportEvent::PageChanged { .. }) => "page_changed",
            SchedulerEvent::Control(ControlEvent::SetBudget { .. }) => "set_budget",
            SchedulerEvent::Control(ControlEvent::SetFixed { .. }) => "set_fixed",
            SchedulerEvent::Control(ControlEvent::SetViewMode { .. }) => "set_view_mode",
        }
    }
}

impl From<ParticipantEvent> for SchedulerEvent {
    fn from(event: ParticipantEvent) -> Self {
        SchedulerEvent::Participant(event)
    }
}

impl From<ViewportEvent> for SchedulerEvent {
    fn from(event: ViewportEvent) -> Self {
        SchedulerEvent::Viewport(event)
    }
}

impl From<ControlEvent> for SchedulerEvent {
    fn from(event: ControlEvent) -> Self {
        SchedulerEvent::Control(event)
    }
}

/// Output of one recomputation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recomputation {
    /// Minimal subscription changes since the previous recomputation.
    pub tier_changes: Vec<TierChange>,
    /// One receive-quality instruction per visible remote participant.
    pub quality: Vec<QualityInstruction>,
    /// Swap made because the window moved while the speaker was off screen.
    pub promotion: Option<Promotion>,
    pub geometry: TileGeometry,
    pub window: WindowLayout,
}

/// Settled state exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerSnapshot {
    pub roster: Vec<ParticipantId>,
    pub tiers: TierMap,
    pub geometry: TileGeometry,
    pub window: WindowLayout,
    pub view_mode: ViewMode,
    pub active_speaker: Option<ParticipantId>,
}

/// Everything the scheduler owns.
#[derive(Debug, Clone)]
pub struct SchedulerState {
    settings: SchedulerSettings,
    roster: Roster,
    directory: ParticipantDirectory,
    viewport_width: u32,
    viewport_height: u32,
    view_mode: ViewMode,
    active_speaker: Option<ParticipantId>,
    fixed_ids: Vec<ParticipantId>,
    budget: Budget,
    tiers: TierMap,
}

fn initial_position(kind: ViewModeKind) -> ViewMode {
    match kind {
        ViewModeKind::Paged => ViewMode::Paged { page: 1 },
        ViewModeKind::Scroll => ViewMode::Scroll { scroll_top: 0.0 },
    }
}

impl SchedulerState {
    #[must_use]
    pub fn new(settings: SchedulerSettings, budget: Budget, view_mode: ViewModeKind) -> Self {
        Self {
            settings,
            roster: Roster::new(),
            directory: ParticipantDirectory::new(),
            viewport_width: 0,
            viewport_height: 0,
            view_mode: initial_position(view_mode),
            active_speaker: None,
            fixed_ids: Vec::new(),
            budget,
            tiers: TierMap::new(),
        }
    }

    /// Initial state for a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.settings.clone(), config.budget, config.view_mode)
    }

    /// Apply any scheduler event.
    ///
    /// Returns the promotion performed, if the event was an active-speaker
    /// change that moved someone on screen.
    pub fn apply(&mut self, event: SchedulerEvent) -> Option<Promotion> {
        match event {
            SchedulerEvent::Participant(event) => self.apply_participant_event(event),
            SchedulerEvent::Viewport(event) => {
                self.apply_viewport_event(&event);
                None
            }
            SchedulerEvent::Control(event) => {
                self.apply_control_event(event);
                None
            }
        }
    }

    pub fn apply_participant_event(&mut self, event: ParticipantEvent) -> Option<Promotion> {
        match event {
            ParticipantEvent::Joined { participant } => {
                if participant.id.is_blank() {
                    return None;
                }
                self.directory.upsert(participant.clone());
                if participant.is_local {
                    self.roster.append(participant.id);
                } else {
                    self.roster.insert_before_first_inactive_cam_off(
                        &participant,
                        &self.directory,
                        self.active_speaker.as_ref(),
                    );
                }
                None
            }
            ParticipantEvent::Left { id } => {
                self.roster.remove(&id);
                self.directory.remove(&id);
                if self.active_speaker.as_ref() == Some(&id) {
                    self.active_speaker = None;
                }
                None
            }
            ParticipantEvent::Updated { mut participant } => {
                if let Some(known) = self.directory.get(&participant.id) {
                    // Locality is fixed at join time.
                    participant.is_local = known.is_local;
                    self.directory.upsert(participant);
                }
                None
            }
            ParticipantEvent::ActiveSpeakerChanged { id, at } => {
                if id.is_blank() {
                    self.active_speaker = None;
                    return None;
                }
                self.directory.mark_active(&id, at);
                if self.directory.is_local(&id) || !self.roster.contains(&id) {
                    // The previous remote speaker no longer holds the floor.
                    self.active_speaker = None;
                    debug!(target: "ts.promoter", speaker = %id, "Ignoring speaker outside remote roster");
                    return None;
                }
                self.active_speaker = Some(id.clone());
                let visible = self.window_layout().visible;
                promoter::promote(&mut self.roster, &visible, &self.directory, &id)
            }
        }
    }

    /// Apply a viewport event. Returns whether the state changed.
    pub fn apply_viewport_event(&mut self, event: &ViewportEvent) -> bool {
        match (*event, &mut self.view_mode) {
            (ViewportEvent::Resized { width, height }, _) => {
                self.viewport_width = width;
                self.viewport_height = height;
                true
            }
            (ViewportEvent::Scrolled { scroll_top }, ViewMode::Scroll { scroll_top: current }) => {
                *current = scroll_top;
                true
            }
            (ViewportEvent::PageChanged { page }, ViewMode::Paged { page: current }) => {
                *current = page.max(1);
                true
            }
            _ => {
                debug!(target: "ts.actor.scheduler", ?event, "Viewport event does not apply to current view mode");
                false
            }
        }
    }

    pub fn apply_control_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SetBudget { budget } => {
                self.set_budget(budget.map_or(Budget::Unbounded, Budget::Limited));
            }
            ControlEvent::SetFixed { ids } => self.set_fixed(ids),
            ControlEvent::SetViewMode { mode } => self.set_view_mode(mode),
        }
    }

    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = budget;
    }

    pub fn set_fixed(&mut self, ids: Vec<ParticipantId>) {
        self.fixed_ids = ids.into_iter().filter(|id| !id.is_blank()).collect();
    }

    /// Switch strategy. Switching to the current strategy keeps the position.
    pub fn set_view_mode(&mut self, kind: ViewModeKind) {
        let same = matches!(
            (kind, self.view_mode),
            (ViewModeKind::Paged, ViewMode::Paged { .. }) | (ViewModeKind::Scroll, ViewMode::Scroll { .. })
        );
        if !same {
            self.view_mode = initial_position(kind);
        }
    }

    fn remote_ids(&self) -> Vec<ParticipantId> {
        self.roster.remote_ids(self.directory.local_id())
    }

    /// Visible window for the current state, with the page clamped.
    #[must_use]
    pub fn window_layout(&self) -> WindowLayout {
        let total = self.remote_ids().len();
        window::compute(
            self.view_mode,
            total,
            self.viewport_width,
            self.viewport_height,
            &self.settings,
        )
    }

    fn geometry(&self, layout: &WindowLayout) -> TileGeometry {
        let local_tile = usize::from(
            self.settings.include_local_tile && self.directory.local_id().is_some(),
        );
        match self.view_mode {
            ViewMode::Paged { .. } => layout::solve(
                layout.visible.len() + local_tile,
                self.viewport_width,
                self.viewport_height,
                self.settings.aspect_ratio,
            ),
            ViewMode::Scroll { .. } => layout::list_geometry(
                layout.visible.len(),
                self.settings.scroll_tile_width,
                self.settings.aspect_ratio,
            ),
        }
    }

    /// Derive tier changes and quality instructions for the current state,
    /// and remember the resulting tier map.
    pub fn recompute(&mut self) -> Recomputation {
        let mut layout = self.window_layout();

        // Departures can leave the viewer past the last page.
        if let (ViewMode::Paged { page }, Some(info)) = (&mut self.view_mode, layout.page) {
            *page = info.page;
        }

        // The window may have come back to the first page since the speaker
        // started talking.
        let promotion = self.active_speaker.clone().and_then(|speaker| {
            promoter::promote(&mut self.roster, &layout.visible, &self.directory, &speaker)
        });
        if promotion.is_some() {
            layout = self.window_layout();
        }

        let remote = self.remote_ids();
        let input = SubscriptionInput {
            remote_ids: &remote,
            window: &layout.visible,
            active_speaker: self.active_speaker.as_ref(),
            fixed_ids: &self.fixed_ids,
            budget: self.budget,
            small_call_threshold: self.settings.small_call_threshold,
        };
        let (tiers, tier_changes) = subscription::recompute(&input, &self.tiers);
        self.tiers = tiers;

        let visible = remote
            .get(layout.visible.start..layout.visible.end.min(remote.len()))
            .unwrap_or_default();
        let quality = quality::instructions(visible, &self.settings);

        Recomputation {
            tier_changes,
            quality,
            promotion,
            geometry: self.geometry(&layout),
            window: layout,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SchedulerSnapshot {
        let layout = self.window_layout();
        SchedulerSnapshot {
            roster: self.roster.ids().to_vec(),
            tiers: self.tiers.clone(),
            geometry: self.geometry(&layout),
            window: layout,
            view_mode: self.view_mode,
            active_speaker: self.active_speaker.clone(),
        }
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    #[must_use]
    pub fn directory(&self) -> &ParticipantDirectory {
        &self.directory
    }

    #[must_use]
    pub fn tiers(&self) -> &TierMap {
        &self.tiers
    }

    #[must_use]
    pub fn active_speaker(&self) -> Option<&ParticipantId> {
        self.active_speaker.as_ref()
    }

    #[must_use]
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    #[must_use]
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }
}
