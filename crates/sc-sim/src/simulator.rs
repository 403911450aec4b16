//! The seam between the controller and the external microsimulation.

use thiserror::Error;

use sc_core::{IntersectionId, LaneId, LaneState, PhaseIndex, SimDuration, SimTime};

/// What a simulator backend can report back.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulatorFault {
    #[error("connection lost: {0}")]
    Disconnected(String),

    #[error("unknown lane {0}")]
    UnknownLane(LaneId),

    #[error("unknown intersection {0}")]
    UnknownIntersection(IntersectionId),

    #[error("{intersection}: {phase} is out of range ({phase_count} phases)")]
    PhaseOutOfRange {
        intersection: IntersectionId,
        phase:        PhaseIndex,
        phase_count:  usize,
    },
}

/// A step-synchronous traffic simulator.
///
/// The controller treats the backend as an opaque stepping oracle: its
/// internal time only moves when [`step`][Self::step] is called.
///
/// # Contract
///
/// - `step(d)` advances by exactly `d` and returns the new time.
/// - `lane_state` returns `Ok(None)` when the lane exists but produced no
///   reading this step (detector dropout), and `UnknownLane` when the lane is
///   not part of the loaded network.
/// - `set_phase` is batched: the new indication becomes visible at the start
///   of the *next* `step`, never immediately.
///
/// Implementations run on the adapter's worker thread, hence `Send`.
pub trait Simulator: Send + 'static {
    /// Current simulated time.  Called once when the adapter connects.
    fn now(&mut self) -> Result<SimTime, SimulatorFault>;

    fn step(&mut self, step: SimDuration) -> Result<SimTime, SimulatorFault>;

    fn lane_state(&mut self, lane: LaneId) -> Result<Option<LaneState>, SimulatorFault>;

    fn set_phase(
        &mut self,
        intersection: IntersectionId,
        phase:        PhaseIndex,
    ) -> Result<(), SimulatorFault>;

    /// Release the connection.  Called exactly once, from the worker thread.
    fn close(&mut self) {}
}
