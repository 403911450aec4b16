//! Run observer trait for telemetry export and progress reporting.

use serde::Serialize;

use sc_control::{LanePressure, SwitchEvent, TelemetryGapWarning};
use sc_core::{IntersectionId, PhaseIndex, SimTime, Tick};

use crate::RunSummary;

/// One intersection's state after one evaluation tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TickRecord {
    pub tick:           Tick,
    pub sim_time:       SimTime,
    pub intersection:   IntersectionId,
    /// The phase showing green; during clearance, the phase being cleared.
    pub active_phase:   PhaseIndex,
    pub clearing:       bool,
    pub degraded:       bool,
    pub lane_pressures: Vec<LanePressure>,
}

/// Callbacks invoked by [`ControlLoop::run`][crate::ControlLoop::run].
///
/// All methods default to no-ops.  Implementations run on the control
/// thread between simulator calls, so anything slow belongs behind a
/// channel (see `sc_output::BackgroundObserver`).
pub trait RunObserver {
    /// Before the simulator is advanced.  `tick` is numbered by the step
    /// about to complete, starting at 1.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// After all commands for the tick have been applied.
    fn on_tick_end(&mut self, _tick: Tick, _time: SimTime) {}

    fn on_switch(&mut self, _event: &SwitchEvent) {}

    fn on_warning(&mut self, _warning: &TelemetryGapWarning) {}

    /// Buffered tick records, handed over by value every flush interval and
    /// once more when the run ends for any reason.
    fn on_flush(&mut self, _records: Vec<TickRecord>) {}

    /// After the final flush of a run that did not fail.
    fn on_run_end(&mut self, _summary: &RunSummary) {}
}

/// A [`RunObserver`] that does nothing.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
