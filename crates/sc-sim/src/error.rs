use thiserror::Error;

use sc_control::ControlError;
use sc_core::{CoreError, IntersectionId, LaneId, PhaseIndex, SimTime};

/// Failures surfaced by [`ClockAdapter`][crate::ClockAdapter].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    #[error("simulator unavailable: {reason}")]
    SimulatorUnavailable { reason: String },

    #[error("simulator desync: expected time {expected}, simulator reported {got}")]
    SimulatorDesync { expected: SimTime, got: SimTime },

    #[error("unknown lane {0}")]
    UnknownLane(LaneId),

    #[error("{intersection}: {phase} is out of range ({phase_count} phases)")]
    InvalidPhaseIndex {
        intersection: IntersectionId,
        phase:        PhaseIndex,
        phase_count:  usize,
    },
}

impl AdapterError {
    /// Lost or untrustworthy connection, as opposed to a caller bug.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            AdapterError::SimulatorUnavailable { .. } | AdapterError::SimulatorDesync { .. }
        )
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("control loop configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("could not connect to simulator: {0}")]
    Connect(AdapterError),

    /// Connectivity failure: the run stopped at `last_good`.  Not retried.
    #[error("simulation aborted after {last_good}: {source}")]
    Aborted {
        last_good: SimTime,
        source:    AdapterError,
    },

    /// The controller asked for something the network does not have.
    #[error("control contract violated at {at}: {source}")]
    Contract {
        at:     SimTime,
        source: AdapterError,
    },

    #[error("controller error: {0}")]
    Control(#[from] ControlError),
}

impl SimError {
    /// Wrap an adapter failure observed at `at` (the last confirmed time).
    pub fn from_adapter(at: SimTime, source: AdapterError) -> Self {
        if source.is_connectivity() {
            SimError::Aborted { last_good: at, source }
        } else {
            SimError::Contract { at, source }
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
