//! A self-contained point-queue traffic model implementing [`Simulator`].
//!
//! Each lane is a vertical queue with a fixed storage capacity:
//!
//! - **Arrivals**: lanes that no intersection feeds receive Bernoulli
//!   arrivals at `arrival_rate_per_hour` (or a per-lane override), one trial
//!   per step.
//! - **Discharge**: incoming lanes of the active phase release vehicles at
//!   the saturation flow rate.  Released vehicles move round-robin onto the
//!   group's outgoing lanes if there is room; a full outgoing lane blocks
//!   discharge, so spillback propagates upstream.
//! - **Exit**: lanes that are not incoming to any intersection drain at the
//!   saturation flow rate.
//!
//! Phase requests from [`set_phase`][Simulator::set_phase] are held until the
//! start of the next step.  All randomness comes from per-lane [`LaneRng`]s,
//! so a seed fixes the whole run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sc_core::{IntersectionId, LaneId, LaneRng, LaneState, PhaseIndex, SimDuration, SimTime};
use sc_network::Corridor;

use crate::{SimError, SimResult, Simulator, SimulatorFault};

/// Seed offset separating telemetry dropout draws from arrival draws.
const DROPOUT_STREAM: u64 = 0x5eed_d0d0_0000_0001;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointQueueConfig {
    pub seed: u64,
    /// Arrival rate on every entry lane, vehicles per hour.
    pub arrival_rate_per_hour: f64,
    /// Per-lane arrival overrides by lane name.  May also name internal
    /// lanes to inject side-street traffic.
    pub lane_arrival_rates: BTreeMap<String, f64>,
    /// Discharge rate of a green lane, vehicles per hour.
    pub saturation_flow_per_hour: f64,
    /// Storage per lane, vehicles.
    pub lane_capacity: u32,
    /// Speed reported for an empty lane, m/s.
    pub free_flow_speed: f64,
    /// Probability that a lane query returns no reading.
    pub dropout_probability: f64,
    /// Lanes that never report.
    pub dead_lanes: Vec<String>,
    /// Simulated time at which the connection drops, for fault drills.
    pub disconnect_after_secs: Option<u64>,
}

impl Default for PointQueueConfig {
    fn default() -> Self {
        Self {
            seed:                     42,
            arrival_rate_per_hour:    600.0,
            lane_arrival_rates:       BTreeMap::new(),
            saturation_flow_per_hour: 1800.0,
            lane_capacity:            40,
            free_flow_speed:          13.9,
            dropout_probability:      0.0,
            dead_lanes:               Vec::new(),
            disconnect_after_secs:    None,
        }
    }
}

impl PointQueueConfig {
    fn validate(&self) -> SimResult<()> {
        let rate_ok = |r: f64| r.is_finite() && r >= 0.0;
        if !rate_ok(self.arrival_rate_per_hour) {
            return Err(SimError::Config("arrival_rate_per_hour must be >= 0".into()));
        }
        if let Some((name, _)) = self.lane_arrival_rates.iter().find(|&(_, &r)| !rate_ok(r)) {
            return Err(SimError::Config(format!("lane_arrival_rates[{name:?}] must be >= 0")));
        }
        if !(self.saturation_flow_per_hour.is_finite() && self.saturation_flow_per_hour > 0.0) {
            return Err(SimError::Config("saturation_flow_per_hour must be > 0".into()));
        }
        if self.lane_capacity == 0 {
            return Err(SimError::Config("lane_capacity must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.dropout_probability) {
            return Err(SimError::Config("dropout_probability must be in [0, 1]".into()));
        }
        Ok(())
    }
}

// ── Model state ───────────────────────────────────────────────────────────────

struct LaneSim {
    queue:         u32,
    /// Arrivals per second.
    arrival_rate:  f64,
    /// Fractional vehicles accrued towards the next discharge.
    credit:        f64,
    /// Fed by no intersection discharge path; exits the network.
    is_exit:       bool,
    dead:          bool,
    arrivals:      LaneRng,
    dropout:       LaneRng,
}

struct SignalSim {
    /// `(incoming, outgoing)` per group, per phase.
    phases:  Vec<Vec<(Vec<LaneId>, Vec<LaneId>)>>,
    active:  PhaseIndex,
    pending: Option<PhaseIndex>,
    /// Round-robin cursor over outgoing lanes, per phase and group.
    cursors: Vec<Vec<usize>>,
}

pub struct PointQueueSimulator {
    now:           SimTime,
    lanes:         Vec<LaneSim>,
    signals:       Vec<SignalSim>,
    capacity:      u32,
    saturation:    f64,
    free_speed:    f64,
    dropout_p:     f64,
    disconnect_at: Option<SimTime>,
}

impl PointQueueSimulator {
    pub fn new(corridor: &Corridor, config: &PointQueueConfig) -> SimResult<Self> {
        config.validate()?;

        let lane_named = |name: &str, field: &str| {
            corridor
                .lane_id(name)
                .ok_or_else(|| SimError::Config(format!("{field}: unknown lane {name:?}")))
        };

        let mut fed = vec![false; corridor.lane_count()];
        let mut controlled = vec![false; corridor.lane_count()];
        for j in corridor.intersections() {
            for &l in j.outgoing_lanes() {
                fed[l.index()] = true;
            }
            for &l in j.incoming_lanes() {
                controlled[l.index()] = true;
            }
        }

        let mut lanes: Vec<LaneSim> = corridor
            .lanes()
            .map(|id| LaneSim {
                queue:        0,
                arrival_rate: if fed[id.index()] { 0.0 } else { config.arrival_rate_per_hour / 3600.0 },
                credit:       0.0,
                is_exit:      !controlled[id.index()],
                dead:         false,
                arrivals:     LaneRng::new(config.seed, id),
                dropout:      LaneRng::new(config.seed ^ DROPOUT_STREAM, id),
            })
            .collect();

        for (name, &rate) in &config.lane_arrival_rates {
            let id = lane_named(name, "lane_arrival_rates")?;
            lanes[id.index()].arrival_rate = rate / 3600.0;
        }
        for name in &config.dead_lanes {
            let id = lane_named(name, "dead_lanes")?;
            lanes[id.index()].dead = true;
        }

        let signals = corridor
            .intersections()
            .iter()
            .map(|j| {
                let phases: Vec<Vec<(Vec<LaneId>, Vec<LaneId>)>> = j
                    .phases
                    .iter()
                    .map(|p| p.groups.iter().map(|g| (g.incoming.clone(), g.outgoing.clone())).collect())
                    .collect();
                let cursors = phases.iter().map(|groups| vec![0; groups.len()]).collect();
                SignalSim { phases, active: PhaseIndex(0), pending: None, cursors }
            })
            .collect();

        Ok(Self {
            now:           SimTime::ZERO,
            lanes,
            signals,
            capacity:      config.lane_capacity,
            saturation:    config.saturation_flow_per_hour / 3600.0,
            free_speed:    config.free_flow_speed,
            dropout_p:     config.dropout_probability,
            disconnect_at: config.disconnect_after_secs.map(SimTime::from_secs),
        })
    }

    /// Vehicles currently queued on `lane`.
    pub fn queue(&self, lane: LaneId) -> Option<u32> {
        self.lanes.get(lane.index()).map(|l| l.queue)
    }

    /// Phase currently shown at `intersection` (pending requests excluded).
    pub fn active_phase(&self, intersection: IntersectionId) -> Option<PhaseIndex> {
        self.signals.get(intersection.index()).map(|s| s.active)
    }

    /// Place `vehicles` on `lane` directly, clamped to capacity.
    pub fn seed_queue(&mut self, lane: LaneId, vehicles: u32) {
        let cap = self.capacity;
        if let Some(l) = self.lanes.get_mut(lane.index()) {
            l.queue = vehicles.min(cap);
        }
    }

    // ── Step phases ───────────────────────────────────────────────────────

    fn arrive(&mut self, secs: f64) {
        let cap = self.capacity;
        for lane in &mut self.lanes {
            if lane.arrival_rate > 0.0 && lane.queue < cap && lane.arrivals.gen_bool(lane.arrival_rate * secs) {
                lane.queue += 1;
            }
        }
    }

    fn discharge(&mut self, secs: f64) {
        let accrual = self.saturation * secs;
        let cap = self.capacity;
        let lanes = &mut self.lanes;

        for signal in &mut self.signals {
            let p = signal.active.index();
            for (g, (incoming, outgoing)) in signal.phases[p].iter().enumerate() {
                let cursor = &mut signal.cursors[p][g];
                for &from in incoming {
                    let src = &mut lanes[from.index()];
                    src.credit += accrual;
                    let mut budget = (src.credit.floor() as u32).min(src.queue);
                    while budget > 0 {
                        // Find room downstream, starting at the cursor.
                        let target = (0..outgoing.len())
                            .map(|k| outgoing[(*cursor + k) % outgoing.len()])
                            .find(|to| lanes[to.index()].queue < cap);
                        if !outgoing.is_empty() && target.is_none() {
                            break;
                        }
                        if let Some(to) = target {
                            lanes[to.index()].queue += 1;
                            *cursor = (*cursor + 1) % outgoing.len();
                        }
                        let src = &mut lanes[from.index()];
                        src.queue -= 1;
                        src.credit -= 1.0;
                        budget -= 1;
                    }
                    let src = &mut lanes[from.index()];
                    // An idle green lane cannot bank discharge capacity.
                    src.credit = src.credit.min(1.0);
                }
            }
        }
    }

    fn drain_exits(&mut self, secs: f64) {
        let accrual = self.saturation * secs;
        for lane in self.lanes.iter_mut().filter(|l| l.is_exit) {
            lane.credit += accrual;
            let out = (lane.credit.floor() as u32).min(lane.queue);
            lane.queue -= out;
            lane.credit = (lane.credit - out as f64).min(1.0);
        }
    }
}

impl Simulator for PointQueueSimulator {
    fn now(&mut self) -> Result<SimTime, SimulatorFault> {
        Ok(self.now)
    }

    fn step(&mut self, step: SimDuration) -> Result<SimTime, SimulatorFault> {
        if self.disconnect_at.is_some_and(|t| self.now >= t) {
            return Err(SimulatorFault::Disconnected(format!("scripted disconnect at {}", self.now)));
        }
        for signal in &mut self.signals {
            if let Some(p) = signal.pending.take() {
                signal.active = p;
            }
        }
        let secs = step.as_secs_f64();
        self.arrive(secs);
        self.discharge(secs);
        self.drain_exits(secs);
        self.now = self.now + step;
        Ok(self.now)
    }

    fn lane_state(&mut self, lane: LaneId) -> Result<Option<LaneState>, SimulatorFault> {
        let p = self.dropout_p;
        let cap = self.capacity as f64;
        let free_speed = self.free_speed;
        let l = self
            .lanes
            .get_mut(lane.index())
            .ok_or(SimulatorFault::UnknownLane(lane))?;
        if l.dead || (p > 0.0 && l.dropout.gen_bool(p)) {
            return Ok(None);
        }
        let occupancy = l.queue as f64 / cap;
        Ok(Some(LaneState {
            lane,
            queue_length: l.queue,
            occupancy,
            mean_speed: free_speed * (1.0 - occupancy),
        }))
    }

    fn set_phase(&mut self, intersection: IntersectionId, phase: PhaseIndex) -> Result<(), SimulatorFault> {
        let signal = self
            .signals
            .get_mut(intersection.index())
            .ok_or(SimulatorFault::UnknownIntersection(intersection))?;
        if phase.index() >= signal.phases.len() {
            return Err(SimulatorFault::PhaseOutOfRange {
                intersection,
                phase,
                phase_count: signal.phases.len(),
            });
        }
        signal.pending = Some(phase);
        Ok(())
    }
}
