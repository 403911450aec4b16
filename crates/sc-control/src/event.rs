//! Values a phase state machine hands back to the control loop.

use serde::Serialize;

use sc_core::{IntersectionId, LaneId, PhaseIndex, SimDuration, SimTime};

/// "Show `phase` at `intersection`": applied by the caller through the
/// simulator adapter; takes effect on the simulator's next step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhaseCommand {
    pub intersection: IntersectionId,
    pub phase:        PhaseIndex,
}

/// Why a switch was committed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchReason {
    /// The active phase reached its maximum green.
    MaxGreen,
    /// An alternative out-scored the active phase by the hysteresis margin.
    Pressure,
}

/// A committed switch: the machine has entered `Clearing(from → to)`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct SwitchEvent {
    pub intersection:  IntersectionId,
    pub at:            SimTime,
    pub from:          PhaseIndex,
    pub to:            PhaseIndex,
    /// Green time `from` had received when the switch was committed.
    pub elapsed_green: SimDuration,
    pub reason:        SwitchReason,
}

/// Non-fatal: an intersection has run on incomplete telemetry for
/// `consecutive_ticks` evaluation ticks in a row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TelemetryGapWarning {
    pub intersection:      IntersectionId,
    pub at:                SimTime,
    pub consecutive_ticks: u32,
    pub missing_lanes:     Vec<LaneId>,
}

/// Everything one evaluation of one machine produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    /// Set only when a clearance completes and the next green begins.
    pub command: Option<PhaseCommand>,
    pub switch:  Option<SwitchEvent>,
    pub warning: Option<TelemetryGapWarning>,
    /// Scores were incomplete this tick.
    pub degraded: bool,
}
