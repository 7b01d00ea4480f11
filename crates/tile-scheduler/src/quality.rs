//! Quality-tier selector.
//!
//! Picks the simulcast layer requested for every visible remote participant.
//! Smaller grids get larger tiles and therefore a higher layer.

use crate::config::SchedulerSettings;
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

/// Receive-quality layer. Discriminants are the transport wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low = 0,
    Mid = 1,
    High = 2,
}

impl QualityTier {
    /// Numeric layer sent to the transport.
    #[must_use]
    pub const fn wire_value(self) -> u8 {
        self as u8
    }

    /// Returns the tier as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Mid => "mid",
            QualityTier::High => "high",
        }
    }
}

/// One receive-quality instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityInstruction {
    pub id: ParticipantId,
    pub quality: QualityTier,
}

/// Tier for a grid showing `visible_count` tiles.
#[must_use]
pub fn select(visible_count: usize, settings: &SchedulerSettings) -> QualityTier {
    if visible_count < settings.quality_high_below {
        QualityTier::High
    } else if visible_count < settings.quality_mid_below {
        QualityTier::Mid
    } else {
        QualityTier::Low
    }
}

/// One instruction per visible remote participant.
///
/// `visible` must already exclude the local participant.
#[must_use]
pub fn instructions(visible: &[ParticipantId], settings: &SchedulerSettings) -> Vec<QualityInstruction> {
    let quality = select(visible.len(), settings);
    visible
        .iter()
        .map(|id| QualityInstruction {
            id: id.clone(),
            quality,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let settings = SchedulerSettings::default();
        assert_eq!(select(0, &settings), QualityTier::High);
        assert_eq!(select(4, &settings), QualityTier::High);
        assert_eq!(select(5, &settings), QualityTier::Mid);
        assert_eq!(select(9, &settings), QualityTier::Mid);
        assert_eq!(select(10, &settings), QualityTier::Low);
        assert_eq!(select(49, &settings), QualityTier::Low);
    }

    #[test]
    fn test_custom_thresholds() {
        let settings = SchedulerSettings {
            quality_high_below: 2,
            quality_mid_below: 3,
            ..SchedulerSettings::default()
        };
        assert_eq!(select(1, &settings), QualityTier::High);
        assert_eq!(select(2, &settings), QualityTier::Mid);
        assert_eq!(select(3, &settings), QualityTier::Low);
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(QualityTier::Low.wire_value(), 0);
        assert_eq!(QualityTier::Mid.wire_value(), 1);
        assert_eq!(QualityTier::High.wire_value(), 2);
        assert_eq!(serde_json::to_string(&QualityTier::Mid).unwrap(), "\"mid\"");
    }

    #[test]
    fn test_one_instruction_per_visible() {
        let settings = SchedulerSettings::default();
        let visible: Vec<ParticipantId> = ["a", "b", "c", "d", "e", "f"]
            .into_iter()
            .map(ParticipantId::from)
            .collect();

        let out = instructions(&visible, &settings);
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|i| i.quality == QualityTier::Mid));
        assert_eq!(out.last().unwrap().id.as_str(), "f");
    }
}
