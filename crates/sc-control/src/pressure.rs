//! Max-pressure scoring.
//!
//! For one intersection and candidate phase:
//!
//! ```text
//! pressure(phase) = Σ_groups [ Σ_in queue_length(lane)
//!                              − α · Σ_out (1 − occupancy(lane)) ]
//! ```
//!
//! With α = 0 outgoing lanes are never read, so the score degrades to pure
//! incoming-queue pressure and a missing downstream detector cannot degrade
//! the intersection.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::Serialize;

use sc_core::{ControllerConfig, LaneId, LaneState, PhaseIndex};
use sc_network::{Intersection, Phase};

use crate::{ControlError, ControlResult};

// ── LaneTelemetry ─────────────────────────────────────────────────────────────

/// Read access to one tick's lane snapshot.
///
/// Implemented for the map types a caller is likely to collect into; the
/// control loop picks the hasher.
pub trait LaneTelemetry {
    /// `None` means the lane produced no telemetry this tick.
    fn lane_state(&self, lane: LaneId) -> Option<&LaneState>;
}

impl<S: BuildHasher> LaneTelemetry for HashMap<LaneId, LaneState, S> {
    #[inline]
    fn lane_state(&self, lane: LaneId) -> Option<&LaneState> {
        self.get(&lane)
    }
}

impl LaneTelemetry for BTreeMap<LaneId, LaneState> {
    #[inline]
    fn lane_state(&self, lane: LaneId) -> Option<&LaneState> {
        self.get(&lane)
    }
}

// ── PressureScore ─────────────────────────────────────────────────────────────

/// Urgency of granting a phase green.  Higher is more urgent.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Serialize)]
pub struct PressureScore(pub f64);

impl PressureScore {
    /// Score given to a phase whose telemetry is incomplete this tick.
    pub const DEGRADED: PressureScore = PressureScore(f64::NEG_INFINITY);

    #[inline]
    pub fn is_degraded(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }
}

/// One lane's contribution, for telemetry records.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct LanePressure {
    pub lane:     LaneId,
    pub pressure: f64,
}

// ── PhaseScores ───────────────────────────────────────────────────────────────

/// Scores for every phase of one intersection at one tick, in phase order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhaseScores {
    pub scores: Vec<PressureScore>,
    /// First missing lane found for each degraded phase.
    pub degraded: Vec<(PhaseIndex, LaneId)>,
}

impl PhaseScores {
    /// Build from raw values; no phase is degraded.
    pub fn from_values(values: &[f64]) -> Self {
        Self {
            scores:   values.iter().copied().map(PressureScore).collect(),
            degraded: Vec::new(),
        }
    }

    #[inline]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    /// Score of `phase`, or [`PressureScore::DEGRADED`] if absent.
    #[inline]
    pub fn get(&self, phase: PhaseIndex) -> PressureScore {
        self.scores
            .get(phase.index())
            .copied()
            .unwrap_or(PressureScore::DEGRADED)
    }

    /// Highest-scoring phase other than `current`.
    ///
    /// Ties go to the lowest phase index so identical inputs always produce
    /// the same choice.
    pub fn best_alternative(&self, current: PhaseIndex) -> Option<(PhaseIndex, PressureScore)> {
        let mut best: Option<(PhaseIndex, PressureScore)> = None;
        for (i, &score) in self.scores.iter().enumerate() {
            let phase = PhaseIndex(i as u16);
            if phase == current {
                continue;
            }
            match best {
                Some((_, s)) if score.0 <= s.0 => {}
                _ => best = Some((phase, score)),
            }
        }
        best
    }

    /// Lanes reported missing this tick, de-duplicated.
    pub fn missing_lanes(&self) -> Vec<LaneId> {
        let mut lanes: Vec<LaneId> = self.degraded.iter().map(|&(_, l)| l).collect();
        lanes.sort_unstable();
        lanes.dedup();
        lanes
    }
}

// ── PressureEstimator ─────────────────────────────────────────────────────────

/// Stateless scorer.  `Copy`, so every worker can hold its own.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PressureEstimator {
    downstream_weight: f64,
}

impl PressureEstimator {
    pub fn new(downstream_weight: f64) -> Self {
        Self { downstream_weight }
    }

    pub fn from_config(cfg: &ControllerConfig) -> Self {
        Self::new(cfg.downstream_weight)
    }

    /// Whether outgoing lanes contribute (and therefore must be queried).
    #[inline]
    pub fn tracks_outgoing(&self) -> bool {
        self.downstream_weight > 0.0
    }

    /// Pressure of one phase.  Fails if any lane it reads is missing.
    pub fn score<T: LaneTelemetry + ?Sized>(
        &self,
        intersection: &Intersection,
        phase:        PhaseIndex,
        lanes:        &T,
    ) -> ControlResult<PressureScore> {
        let def = intersection.phase(phase).ok_or(ControlError::PhaseOutOfRange {
            intersection: intersection.id,
            phase,
            phase_count:  intersection.phase_count(),
        })?;
        self.score_phase(intersection, def, lanes)
    }

    fn score_phase<T: LaneTelemetry + ?Sized>(
        &self,
        intersection: &Intersection,
        phase:        &Phase,
        lanes:        &T,
    ) -> ControlResult<PressureScore> {
        let read = |lane: LaneId| {
            lanes.lane_state(lane).ok_or(ControlError::MissingTelemetry {
                intersection: intersection.id,
                lane,
            })
        };

        let mut total = 0.0;
        for group in &phase.groups {
            let mut queued = 0.0;
            for &lane in &group.incoming {
                queued += read(lane)?.queue_length as f64;
            }
            let mut free = 0.0;
            if self.tracks_outgoing() {
                for &lane in &group.outgoing {
                    free += read(lane)?.free_fraction();
                }
            }
            total += queued - self.downstream_weight * free;
        }
        Ok(PressureScore(total))
    }

    /// Score every phase, degrading those with missing telemetry.
    pub fn score_all<T: LaneTelemetry + ?Sized>(
        &self,
        intersection: &Intersection,
        lanes:        &T,
    ) -> PhaseScores {
        let mut out = PhaseScores {
            scores:   Vec::with_capacity(intersection.phase_count()),
            degraded: Vec::new(),
        };
        for (index, phase) in intersection.indexed_phases() {
            match self.score_phase(intersection, phase, lanes) {
                Ok(score) => out.scores.push(score),
                Err(ControlError::MissingTelemetry { lane, .. }) => {
                    out.scores.push(PressureScore::DEGRADED);
                    out.degraded.push((index, lane));
                }
                // score_phase only reports missing telemetry.
                Err(_) => out.scores.push(PressureScore::DEGRADED),
            }
        }
        out
    }

    /// Per-lane contributions for every lane this intersection reads.
    ///
    /// Lanes without telemetry are omitted.
    pub fn lane_breakdown<T: LaneTelemetry + ?Sized>(
        &self,
        intersection: &Intersection,
        lanes:        &T,
    ) -> Vec<LanePressure> {
        let mut out = Vec::with_capacity(intersection.incoming_lanes().len());
        for &lane in intersection.incoming_lanes() {
            if let Some(s) = lanes.lane_state(lane) {
                out.push(LanePressure { lane, pressure: s.queue_length as f64 });
            }
        }
        if self.tracks_outgoing() {
            for &lane in intersection.outgoing_lanes() {
                if let Some(s) = lanes.lane_state(lane) {
                    out.push(LanePressure {
                        lane,
                        pressure: -self.downstream_weight * s.free_fraction(),
                    });
                }
            }
        }
        out
    }
}
