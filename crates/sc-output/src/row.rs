//! Flat row types written by output backends.

use sc_control::{SwitchEvent, SwitchReason, TelemetryGapWarning};
use sc_sim::TickRecord;

/// One lane's pressure contribution at one evaluation tick, with the owning
/// intersection's signal state.
///
/// A record whose lanes all lacked telemetry still produces one row, with
/// `lane` and `pressure` empty, so the signal state is never lost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanePressureRow {
    pub tick:          u64,
    pub sim_time_secs: f64,
    pub intersection:  u32,
    pub active_phase:  u16,
    pub clearing:      bool,
    pub degraded:      bool,
    pub lane:          Option<u32>,
    pub pressure:      Option<f64>,
}

impl LanePressureRow {
    /// Flatten a batch of tick records, preserving order.
    pub fn from_records(records: &[TickRecord]) -> Vec<Self> {
        let mut rows = Vec::with_capacity(records.iter().map(|r| r.lane_pressures.len().max(1)).sum());
        for r in records {
            let base = Self {
                tick:          r.tick.0,
                sim_time_secs: r.sim_time.as_secs_f64(),
                intersection:  r.intersection.0,
                active_phase:  r.active_phase.0,
                clearing:      r.clearing,
                degraded:      r.degraded,
                lane:          None,
                pressure:      None,
            };
            if r.lane_pressures.is_empty() {
                rows.push(base);
            }
            for p in &r.lane_pressures {
                rows.push(Self { lane: Some(p.lane.0), pressure: Some(p.pressure), ..base });
            }
        }
        rows
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchRow {
    pub sim_time_secs:      f64,
    pub intersection:       u32,
    pub from_phase:         u16,
    pub to_phase:           u16,
    pub elapsed_green_secs: f64,
    pub reason:             &'static str,
}

impl From<&SwitchEvent> for SwitchRow {
    fn from(e: &SwitchEvent) -> Self {
        Self {
            sim_time_secs:      e.at.as_secs_f64(),
            intersection:       e.intersection.0,
            from_phase:         e.from.0,
            to_phase:           e.to.0,
            elapsed_green_secs: e.elapsed_green.as_secs_f64(),
            reason:             match e.reason {
                SwitchReason::MaxGreen => "max_green",
                SwitchReason::Pressure => "pressure",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarningRow {
    pub sim_time_secs:     f64,
    pub intersection:      u32,
    pub consecutive_ticks: u32,
    /// Lane ids joined with `;`.
    pub missing_lanes:     String,
}

impl From<&TelemetryGapWarning> for WarningRow {
    fn from(w: &TelemetryGapWarning) -> Self {
        Self {
            sim_time_secs:     w.at.as_secs_f64(),
            intersection:      w.intersection.0,
            consecutive_ticks: w.consecutive_ticks,
            missing_lanes:     w
                .missing_lanes
                .iter()
                .map(|l| l.0.to_string())
                .collect::<Vec<_>>()
                .join(";"),
        }
    }
}
