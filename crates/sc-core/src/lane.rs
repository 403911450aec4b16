//! Per-lane telemetry snapshot.

use crate::LaneId;

/// One lane's state at a single simulated instant.
///
/// Produced fresh every evaluation tick by the clock adapter and consumed
/// immediately by the pressure estimator.  Never mutated.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaneState {
    pub lane: LaneId,
    /// Vehicles on the lane moving slower than the simulator's halting
    /// threshold.
    pub queue_length: u32,
    /// Fraction of the lane's storage that is occupied, in `[0, 1]`.
    pub occupancy: f64,
    /// Mean speed of vehicles on the lane, m/s.
    pub mean_speed: f64,
}

impl LaneState {
    /// Free capacity fraction, `1 − occupancy`, clamped to `[0, 1]`.
    #[inline]
    pub fn free_fraction(&self) -> f64 {
        (1.0 - self.occupancy).clamp(0.0, 1.0)
    }
}
