//! `SchedulerActor` - single owner of the scheduler state.
//!
//! Every trigger (resize, scroll, page change, roster mutation, active
//! speaker, budget or pinned-id change) is applied to the state as soon as
//! it arrives and re-arms the debounce timer. When the timer fires the actor
//! recomputes once and pushes the resulting instructions to the transport.
//! Bursts therefore collapse into one recomputation reflecting the last
//! write; intermediate states are never emitted.
//!
//! Teardown cancels the pending timer. Nothing is emitted after shutdown.

use super::messages::SchedulerMessage;
use super::metrics::MailboxMonitor;
use crate::config::ViewModeKind;
use crate::errors::SchedulerError;
use crate::observability::metrics;
use crate::participant::ParticipantId;
use crate::state::{ControlEvent, Recomputation, SchedulerEvent, SchedulerSnapshot, SchedulerState};
use crate::subscription::{Budget, Tier};
use crate::timer::DebounceTimer;
use crate::transport::MediaTransport;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the scheduler mailbox.
const SCHEDULER_CHANNEL_BUFFER: usize = 256;

/// Handle to a `SchedulerActor`.
#[derive(Clone)]
pub struct SchedulerActorHandle {
    sender: mpsc::Sender<SchedulerMessage>,
    cancel_token: CancellationToken,
    snapshots: watch::Receiver<SchedulerSnapshot>,
    mailbox: Arc<MailboxMonitor>,
    name: String,
}

impl SchedulerActorHandle {
    /// Get the scheduler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: SchedulerMessage) -> Result<(), SchedulerError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| SchedulerError::ActorUnavailable(format!("channel send failed: {e}")))?;
        self.mailbox.record_enqueue();
        Ok(())
    }

    /// Apply an event. Instructions follow after the debounce delay.
    pub async fn send_event(&self, event: impl Into<SchedulerEvent>) -> Result<(), SchedulerError> {
        self.send(SchedulerMessage::Event(event.into())).await
    }

    /// Change the subscription budget.
    pub async fn set_budget(&self, budget: Budget) -> Result<(), SchedulerError> {
        let budget = match budget {
            Budget::Unbounded => None,
            Budget::Limited(n) => Some(n),
        };
        self.send_event(ControlEvent::SetBudget { budget }).await
    }

    /// Replace the pinned or presenter ids.
    pub async fn set_fixed(&self, ids: Vec<ParticipantId>) -> Result<(), SchedulerError> {
        self.send_event(ControlEvent::SetFixed { ids }).await
    }

    /// Switch between paged and scroll strategies.
    pub async fn set_view_mode(&self, mode: ViewModeKind) -> Result<(), SchedulerError> {
        self.send_event(ControlEvent::SetViewMode { mode }).await
    }

    /// Recompute now, skipping any pending debounce.
    pub async fn flush(&self) -> Result<Recomputation, SchedulerError> {
        let (tx, rx) = oneshot::channel();
        self.send(SchedulerMessage::Flush { respond_to: tx }).await?;
        rx.await
            .map_err(|e| SchedulerError::ActorUnavailable(format!("response receive failed: {e}")))
    }

    /// Current state, including changes not yet settled.
    pub async fn snapshot(&self) -> Result<SchedulerSnapshot, SchedulerError> {
        let (tx, rx) = oneshot::channel();
        self.send(SchedulerMessage::GetSnapshot { respond_to: tx })
            .await?;
        rx.await
            .map_err(|e| SchedulerError::ActorUnavailable(format!("response receive failed: {e}")))
    }

    /// Watch settled snapshots. Updated after every recomputation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the actor, discarding any pending recomputation.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        let (tx, rx) = oneshot::channel();
        self.send(SchedulerMessage::Shutdown { respond_to: tx })
            .await?;
        rx.await
            .map_err(|e| SchedulerError::ActorUnavailable(format!("response receive failed: {e}")))
    }

    /// Cancel the actor without waiting for acknowledgement.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The scheduler actor.
pub struct SchedulerActor {
    name: String,
    receiver: mpsc::Receiver<SchedulerMessage>,
    cancel_token: CancellationToken,
    state: SchedulerState,
    transport: Arc<dyn MediaTransport>,
    debounce: DebounceTimer,
    snapshots: watch::Sender<SchedulerSnapshot>,
    mailbox: Arc<MailboxMonitor>,
    recomputations: u64,
}

impl SchedulerActor {
    /// Spawn the actor.
    ///
    /// Returns a handle and the task join handle.
    ///
    /// # Arguments
    ///
    /// * `name` - Identifier used in logs
    /// * `state` - Initial scheduler state
    /// * `debounce` - Delay between the last trigger and recomputation
    /// * `transport` - Receives subscription and quality instructions
    /// * `cancel_token` - Cancelling it tears the actor down
    pub fn spawn(
        name: impl Into<String>,
        state: SchedulerState,
        debounce: Duration,
        transport: Arc<dyn MediaTransport>,
        cancel_token: CancellationToken,
    ) -> (SchedulerActorHandle, JoinHandle<()>) {
        let name = name.into();
        let (sender, receiver) = mpsc::channel(SCHEDULER_CHANNEL_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let mailbox = Arc::new(MailboxMonitor::new(&name));

        let actor = Self {
            name: name.clone(),
            receiver,
            cancel_token: cancel_token.clone(),
            state,
            transport,
            debounce: DebounceTimer::new(debounce),
            snapshots: snapshot_tx,
            mailbox: Arc::clone(&mailbox),
            recomputations: 0,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SchedulerActorHandle {
            sender,
            cancel_token,
            snapshots: snapshot_rx,
            mailbox,
            name,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "ts.actor.scheduler", fields(scheduler = %self.name))]
    async fn run(mut self) {
        info!(
            target: "ts.actor.scheduler",
            scheduler = %self.name,
            debounce_ms = u64::try_from(self.debounce.delay().as_millis()).unwrap_or(u64::MAX),
            "SchedulerActor started"
        );

        loop {
            tokio::select! {
                // Teardown wins over a timer that is due at the same instant.
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "ts.actor.scheduler",
                        scheduler = %self.name,
                        "SchedulerActor received cancellation signal"
                    );
                    self.debounce.cancel();
                    break;
                }

                () = self.debounce.fired(), if self.debounce.is_pending() => {
                    self.debounce.cancel();
                    self.settle().await;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.record_dequeue();
                            debug!(
                                target: "ts.actor.scheduler",
                                message = message.kind(),
                                "Message received"
                            );
                            if !self.handle_message(message).await {
                                break;
                            }
                        }
                        None => {
                            info!(
                                target: "ts.actor.scheduler",
                                scheduler = %self.name,
                                "SchedulerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "ts.actor.scheduler",
            scheduler = %self.name,
            recomputations = self.recomputations,
            messages_processed = self.mailbox.messages_processed(),
            "SchedulerActor stopped"
        );
    }

    /// Handle a single message. Returns `false` when the actor should stop.
    async fn handle_message(&mut self, message: SchedulerMessage) -> bool {
        match message {
            SchedulerMessage::Event(event) => {
                let kind = event.kind();
                metrics::record_event(kind);
                if let Some(promotion) = self.state.apply(event) {
                    metrics::record_promotion();
                    debug!(
                        target: "ts.actor.scheduler",
                        promoted = %promotion.promoted,
                        demoted = %promotion.demoted,
                        "Active speaker promoted"
                    );
                }
                self.debounce.schedule();
                debug!(target: "ts.actor.scheduler", event = kind, "Event applied, recompute scheduled");
                true
            }

            SchedulerMessage::Flush { respond_to } => {
                self.debounce.cancel();
                let result = self.settle().await;
                let _ = respond_to.send(result);
                true
            }

            SchedulerMessage::GetSnapshot { respond_to } => {
                let _ = respond_to.send(self.state.snapshot());
                true
            }

            SchedulerMessage::Shutdown { respond_to } => {
                let discarded = self.debounce.cancel();
                info!(
                    target: "ts.actor.scheduler",
                    scheduler = %self.name,
                    discarded_pending = discarded,
                    "SchedulerActor shutting down"
                );
                self.cancel_token.cancel();
                let _ = respond_to.send(());
                false
            }
        }
    }

    /// Recompute and push instructions to the transport.
    async fn settle(&mut self) -> Recomputation {
        let started = Instant::now();
        let result = self.state.recompute();
        metrics::record_recomputation(started.elapsed());
        self.recomputations += 1;

        if let Some(promotion) = &result.promotion {
            metrics::record_promotion();
            debug!(
                target: "ts.actor.scheduler",
                promoted = %promotion.promoted,
                demoted = %promotion.demoted,
                "Active speaker promoted after window change"
            );
        }

        for change in &result.tier_changes {
            match self.transport.set_subscription(&change.id, change.to).await {
                Ok(()) => metrics::record_tier_change(change.to.as_str()),
                Err(e) => {
                    let err = SchedulerError::from(e);
                    warn!(
                        target: "ts.actor.scheduler",
                        participant = %change.id,
                        tier = change.to.as_str(),
                        error = %err,
                        error_kind = err.kind(),
                        "Transport rejected subscription change"
                    );
                    metrics::record_transport_error("set_subscription");
                }
            }
        }

        for instruction in &result.quality {
            match self
                .transport
                .set_receive_quality(&instruction.id, instruction.quality)
                .await
            {
                Ok(()) => metrics::record_quality_instruction(instruction.quality.as_str()),
                Err(e) => {
                    let err = SchedulerError::from(e);
                    warn!(
                        target: "ts.actor.scheduler",
                        participant = %instruction.id,
                        quality = instruction.quality.as_str(),
                        error = %err,
                        error_kind = err.kind(),
                        "Transport rejected receive quality"
                    );
                    metrics::record_transport_error("set_receive_quality");
                }
            }
        }

        let subscribed = self.state.tiers().count(Tier::Subscribed);
        metrics::set_subscribed_streams(subscribed);
        metrics::set_roster_size(self.state.roster().len());
        self.snapshots.send_replace(self.state.snapshot());

        debug!(
            target: "ts.actor.scheduler",
            scheduler = %self.name,
            tier_changes = result.tier_changes.len(),
            quality_instructions = result.quality.len(),
            subscribed,
            window_start = result.window.visible.start,
            window_end = result.window.visible.end,
            "Recomputation settled"
        );

        result
    }
}
