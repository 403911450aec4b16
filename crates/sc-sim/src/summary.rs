use std::collections::BTreeMap;

use serde::Serialize;

use sc_control::TelemetryGapWarning;
use sc_core::SimTime;

/// What a run did, reported when it ends without error.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Simulator steps completed.
    pub ticks:          u64,
    pub final_time:     SimTime,
    /// Phase switches per intersection name.
    pub switches:       BTreeMap<String, u64>,
    /// Intersection-evaluations that ran on incomplete telemetry.
    pub degraded_evals: u64,
    pub warnings:       Vec<TelemetryGapWarning>,
    /// Stopped by a [`CancelToken`][crate::CancelToken] before `end_time`.
    pub cancelled:      bool,
}

impl RunSummary {
    pub fn total_switches(&self) -> u64 {
        self.switches.values().sum()
    }
}
