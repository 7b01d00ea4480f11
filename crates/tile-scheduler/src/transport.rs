//! Media transport seam.
//!
//! The scheduler issues two kinds of commands to the media layer: change a
//! participant's subscription tier, and request a simulcast receive layer.
//! Delivery and retry are the transport's concern; failures are reported
//! back only so they can be logged and counted.

use crate::participant::ParticipantId;
use crate::quality::QualityTier;
use crate::subscription::Tier;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Error returned by a [`MediaTransport`] implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport refused the instruction.
    #[error("Transport rejected instruction: {0}")]
    Rejected(String),

    /// The underlying sink is gone.
    #[error("Transport closed: {0}")]
    Closed(String),
}

/// One outbound command, as written on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportInstruction {
    SetSubscription { id: ParticipantId, tier: Tier },
    SetReceiveQuality {
        id: ParticipantId,
        quality: QualityTier,
        /// Numeric simulcast layer.
        layer: u8,
    },
}

/// Trait for media transport operations (enables mocking).
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    /// Move a participant's video into the given tier.
    async fn set_subscription(&self, id: &ParticipantId, tier: Tier) -> Result<(), TransportError>;

    /// Request a receive-quality layer for a participant's video.
    async fn set_receive_quality(
        &self,
        id: &ParticipantId,
        quality: QualityTier,
    ) -> Result<(), TransportError>;
}

/// Writes every instruction as one JSON object per line.
pub struct JsonLinesTransport<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer, e.g. to inspect a buffer in tests.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn write(&self, instruction: &TransportInstruction) -> Result<(), TransportError> {
        let mut line = serde_json::to_vec(instruction)
            .map_err(|e| TransportError::Rejected(format!("serialization failed: {e}")))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| TransportError::Closed(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::Closed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl<W> MediaTransport for JsonLinesTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn set_subscription(&self, id: &ParticipantId, tier: Tier) -> Result<(), TransportError> {
        self.write(&TransportInstruction::SetSubscription {
            id: id.clone(),
            tier,
        })
        .await
    }

    async fn set_receive_quality(
        &self,
        id: &ParticipantId,
        quality: QualityTier,
    ) -> Result<(), TransportError> {
        self.write(&TransportInstruction::SetReceiveQuality {
            id: id.clone(),
            quality,
            layer: quality.wire_value(),
        })
        .await
    }
}

/// Mock transport module for testing.
///
/// This module provides a recording transport for use in tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Records every instruction it receives.
    #[derive(Default)]
    pub struct RecordingTransport {
        instructions: Mutex<Vec<TransportInstruction>>,
        call_count: AtomicUsize,
        fail: AtomicBool,
    }

    impl RecordingTransport {
        /// Create a transport that accepts everything.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a transport that rejects everything (still counted).
        pub fn failing() -> Self {
            let transport = Self::default();
            transport.fail.store(true, Ordering::SeqCst);
            transport
        }

        /// Get the number of calls made, including rejected ones.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Instructions accepted so far, in order.
        pub async fn instructions(&self) -> Vec<TransportInstruction> {
            self.instructions.lock().await.clone()
        }

        /// Drain the accepted instructions.
        pub async fn take(&self) -> Vec<TransportInstruction> {
            std::mem::take(&mut *self.instructions.lock().await)
        }

        /// Accepted subscription instructions as `(id, tier)` pairs.
        pub async fn subscriptions(&self) -> Vec<(String, Tier)> {
            self.instructions
                .lock()
                .await
                .iter()
                .filter_map(|i| match i {
                    TransportInstruction::SetSubscription { id, tier } => {
                        Some((id.to_string(), *tier))
                    }
                    TransportInstruction::SetReceiveQuality { .. } => None,
                })
                .collect()
        }

        async fn record(&self, instruction: TransportInstruction) -> Result<(), TransportError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::Rejected("mock transport failure".to_string()));
            }
            self.instructions.lock().await.push(instruction);
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl MediaTransport for RecordingTransport {
        async fn set_subscription(
            &self,
            id: &ParticipantId,
            tier: Tier,
        ) -> Result<(), TransportError> {
            self.record(TransportInstruction::SetSubscription {
                id: id.clone(),
                tier,
            })
            .await
        }

        async fn set_receive_quality(
            &self,
            id: &ParticipantId,
            quality: QualityTier,
        ) -> Result<(), TransportError> {
            self.record(TransportInstruction::SetReceiveQuality {
                id: id.clone(),
                quality,
                layer: quality.wire_value(),
            })
            .await
        }
    }
}
