//! Tile Scheduler error types.
//!
//! Scheduling itself never fails: races degrade to no-ops and degenerate
//! geometry short-circuits. Errors only arise at the edges, when loading
//! configuration or talking to the scheduler actor.

use crate::config::ConfigError;
use crate::transport::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The actor mailbox is closed or the actor dropped a reply.
    #[error("Scheduler actor unavailable: {0}")]
    ActorUnavailable(String),

    /// The media transport rejected an instruction.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl SchedulerError {
    /// Returns the error as a string for metric labels and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            SchedulerError::Config(_) => "config",
            SchedulerError::ActorUnavailable(_) => "actor_unavailable",
            SchedulerError::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        let err = SchedulerError::ActorUnavailable("channel send failed".to_string());
        assert_eq!(
            err.to_string(),
            "Scheduler actor unavailable: channel send failed"
        );

        let err: SchedulerError = ConfigError::InvalidValue("TS_TILE_GAP".to_string()).into();
        assert!(err.to_string().contains("TS_TILE_GAP"));
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_transport_conversion() {
        let err: SchedulerError = TransportError::Closed("broken pipe".to_string()).into();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("broken pipe"));
    }
}
