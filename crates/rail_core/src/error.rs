use thiserror::Error;

use crate::{BlockId, DispatcherId, SessionId, StationId, TrainId};

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Every failure the rail simulation can report.
///
/// Construction errors are raised at the boundary (ids, progress, speed,
/// delta), structural errors while building a [`crate::Line`], and runtime
/// errors by [`crate::SimulationState`] and the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("train id is empty")]
    TrainIdEmpty,
    #[error("block id is empty")]
    BlockIdEmpty,
    #[error("station id is empty")]
    StationIdEmpty,
    #[error("session id is empty")]
    SessionIdEmpty,
    #[error("dispatcher id is empty")]
    DispatcherIdEmpty,
    #[error("dispatcher name is required")]
    DispatcherNameEmpty,
    #[error("dispatcher name is too long ({chars} characters, max {max})")]
    DispatcherNameTooLong { chars: usize, max: usize },

    #[error("block progress must be in range [0,1], got {0}")]
    BlockProgressOutOfRange(f64),
    #[error("tick delta must be greater than zero")]
    TickDeltaNotPositive,
    #[error("tick delta of {millis} ms exceeds the supported range")]
    TickDeltaOverflow { millis: i64 },
    #[error("train speed must be a finite value greater than zero, got {0}")]
    TrainSpeedNotPositive(f64),

    #[error("line must have at least one block")]
    LineHasNoBlocks,
    #[error("line must have blocks+1 stations ({stations} stations, {blocks} blocks)")]
    LineStationsBlocksMismatch { stations: usize, blocks: usize },
    #[error("line has duplicate station id '{0}'")]
    LineDuplicateStationId(StationId),
    #[error("line has duplicate block id '{0}'")]
    LineDuplicateBlockId(BlockId),
    #[error("line connectivity is invalid at block '{block}'")]
    LineConnectivityInvalid { block: String },

    #[error("block '{0}' not found")]
    BlockNotFound(BlockId),
    #[error("train '{0}' already exists")]
    TrainAlreadyExists(TrainId),
    #[error("train '{0}' not found")]
    TrainNotFound(TrainId),
    #[error("block '{block}' is occupied by train '{by}'")]
    BlockOccupied { block: BlockId, by: TrainId },

    #[error("simulation for session '{0}' not found")]
    SimulationNotFound(SessionId),
    #[error("simulation for session '{0}' already exists")]
    SimulationAlreadyExists(SessionId),

    #[error("dispatcher '{0}' already joined the session")]
    DispatcherAlreadyExists(DispatcherId),
    #[error("dispatcher '{0}' is not in the session")]
    DispatcherNotFound(DispatcherId),
    #[error("training session '{0}' not found")]
    TrainingSessionNotFound(SessionId),
    #[error("training session '{0}' already exists")]
    TrainingSessionAlreadyExists(SessionId),

    #[error("simulation clock overflowed")]
    ClockOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_offender() {
        let err = SimError::BlockOccupied {
            block: BlockId::new("B1").unwrap(),
            by: TrainId::new("T7").unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("B1"));
        assert!(msg.contains("T7"));
    }

    #[test]
    fn mismatch_reports_counts() {
        let msg = SimError::LineStationsBlocksMismatch {
            stations: 2,
            blocks: 2,
        }
        .to_string();
        assert!(msg.contains("2 stations"), "got: {msg}");
    }
}
