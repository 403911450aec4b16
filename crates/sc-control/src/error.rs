use thiserror::Error;

use sc_core::{CoreError, IntersectionId, LaneId, PhaseIndex};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{intersection}: no telemetry for {lane} this tick")]
    MissingTelemetry {
        intersection: IntersectionId,
        lane:         LaneId,
    },

    #[error("{intersection}: {phase} is out of range ({phase_count} phases)")]
    PhaseOutOfRange {
        intersection: IntersectionId,
        phase:        PhaseIndex,
        phase_count:  usize,
    },

    #[error("controller configuration error: {0}")]
    Config(#[from] CoreError),
}

pub type ControlResult<T> = Result<T, ControlError>;
