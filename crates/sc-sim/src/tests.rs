//! Integration tests for sc-sim.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sc_control::{SwitchEvent, TelemetryGapWarning};
use sc_core::{
    ControllerConfig, IntersectionId, LaneId, LaneState, PhaseIndex, RunConfig, SimDuration, SimTime, Tick,
};
use sc_network::{Corridor, CorridorBuilder, LaneGroup, PhaseSpec};

use crate::{
    AdapterError, CancelToken, ClockAdapter, ControlLoop, ControlLoopBuilder, NoopObserver,
    PointQueueConfig, PointQueueSimulator, RunObserver, RunSummary, SimError, Simulator,
    SimulatorFault, TickRecord,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const A: LaneId = LaneId(0);
const B: LaneId = LaneId(1);
const J1: IntersectionId = IntersectionId(0);

fn secs(s: u64) -> SimTime {
    SimTime::from_secs(s)
}

fn spec(incoming: LaneId, outgoing: Vec<LaneId>, min: f64, max: f64) -> PhaseSpec {
    PhaseSpec {
        groups:         vec![LaneGroup::new(vec![incoming], outgoing)],
        min_green_secs: min,
        max_green_secs: max,
        clearance_secs: 2.0,
    }
}

/// One intersection, J1: phase 0 serves lane `a`, phase 1 serves lane `b`.
fn junction_with(min: f64, max: f64, clearance: f64) -> Corridor {
    let mut b = CorridorBuilder::new();
    let a = b.add_lane("a");
    let bl = b.add_lane("b");
    let phase = |lane| PhaseSpec { clearance_secs: clearance, ..spec(lane, vec![], min, max) };
    b.add_intersection("J1", vec![phase(a), phase(bl)]);
    b.build().unwrap()
}

/// Min green 5 s, max green 20 s, clearance 2 s.
fn junction() -> Corridor {
    junction_with(5.0, 20.0, 2.0)
}

fn control_on(
    corridor: Corridor,
    end_secs: f64,
    tweak: impl FnOnce(&mut ControllerConfig, &mut RunConfig),
) -> ControlLoop {
    let mut controller = ControllerConfig::default();
    let mut run = RunConfig { end_time_secs: end_secs, ..RunConfig::default() };
    tweak(&mut controller, &mut run);
    ControlLoopBuilder::new(corridor, controller, run).build().unwrap()
}

fn control(end_secs: f64, tweak: impl FnOnce(&mut ControllerConfig, &mut RunConfig)) -> ControlLoop {
    control_on(junction(), end_secs, tweak)
}

/// Shared handles for inspecting a [`ScriptedSim`] after it moved to the
/// adapter's worker thread.
#[derive(Clone, Default)]
struct Probe {
    commands: Arc<Mutex<Vec<(SimTime, IntersectionId, PhaseIndex)>>>,
    queries:  Arc<AtomicUsize>,
    closed:   Arc<AtomicBool>,
}

impl Probe {
    fn commands(&self) -> Vec<(SimTime, IntersectionId, PhaseIndex)> {
        self.commands.lock().unwrap().clone()
    }
}

/// Backend with fixed queues and optional scripted faults.
#[derive(Clone)]
struct Script {
    lane_count:    u32,
    phase_counts:  Vec<usize>,
    queues:        Vec<u32>,
    /// Lane that reports nothing for sim times in `[from, until]`.
    silent:        Option<(LaneId, SimTime, SimTime)>,
    skip_at:       Option<SimTime>,
    hang_at:       Option<SimTime>,
    disconnect_at: Option<SimTime>,
    refuse:        bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            lane_count:    2,
            phase_counts:  vec![2],
            queues:        vec![0, 0],
            silent:        None,
            skip_at:       None,
            hang_at:       None,
            disconnect_at: None,
            refuse:        false,
        }
    }
}

struct ScriptedSim {
    script: Script,
    probe:  Probe,
    now:    SimTime,
}

impl ScriptedSim {
    fn new(script: Script) -> (Self, Probe) {
        let probe = Probe::default();
        (Self { script, probe: probe.clone(), now: SimTime::ZERO }, probe)
    }
}

impl Simulator for ScriptedSim {
    fn now(&mut self) -> Result<SimTime, SimulatorFault> {
        if self.script.refuse {
            return Err(SimulatorFault::Disconnected("connection refused".into()));
        }
        Ok(self.now)
    }

    fn step(&mut self, step: SimDuration) -> Result<SimTime, SimulatorFault> {
        if self.script.disconnect_at == Some(self.now) {
            return Err(SimulatorFault::Disconnected("socket closed".into()));
        }
        if self.script.hang_at == Some(self.now) {
            std::thread::sleep(Duration::from_millis(1_000));
        }
        let taken = if self.script.skip_at == Some(self.now) { step.times(2) } else { step };
        self.now = self.now + taken;
        Ok(self.now)
    }

    fn lane_state(&mut self, lane: LaneId) -> Result<Option<LaneState>, SimulatorFault> {
        self.probe.queries.fetch_add(1, Ordering::Relaxed);
        if lane.0 >= self.script.lane_count {
            return Err(SimulatorFault::UnknownLane(lane));
        }
        if let Some((silent, from, until)) = self.script.silent {
            if silent == lane && from <= self.now && self.now <= until {
                return Ok(None);
            }
        }
        Ok(Some(LaneState {
            lane,
            queue_length: self.script.queues.get(lane.index()).copied().unwrap_or(0),
            occupancy:    0.0,
            mean_speed:   10.0,
        }))
    }

    fn set_phase(&mut self, intersection: IntersectionId, phase: PhaseIndex) -> Result<(), SimulatorFault> {
        let count = self.script.phase_counts[intersection.index()];
        if phase.index() >= count {
            return Err(SimulatorFault::PhaseOutOfRange { intersection, phase, phase_count: count });
        }
        self.probe.commands.lock().unwrap().push((self.now, intersection, phase));
        Ok(())
    }

    fn close(&mut self) {
        self.probe.closed.store(true, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct Collector {
    records:      Vec<TickRecord>,
    switches:     Vec<SwitchEvent>,
    warnings:     Vec<TelemetryGapWarning>,
    flushes:      usize,
    ended:        Option<RunSummary>,
    cancel_after: Option<(Tick, CancelToken)>,
}

impl RunObserver for Collector {
    fn on_tick_end(&mut self, tick: Tick, _time: SimTime) {
        if let Some((at, token)) = &self.cancel_after {
            if tick == *at {
                token.cancel();
            }
        }
    }

    fn on_switch(&mut self, event: &SwitchEvent) {
        self.switches.push(*event);
    }

    fn on_warning(&mut self, warning: &TelemetryGapWarning) {
        self.warnings.push(warning.clone());
    }

    fn on_flush(&mut self, records: Vec<TickRecord>) {
        self.flushes += 1;
        self.records.extend(records);
    }

    fn on_run_end(&mut self, summary: &RunSummary) {
        self.ended = Some(summary.clone());
    }
}

// ── ControlLoopBuilder ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn one_machine_per_intersection() {
        let c = control(10.0, |_, _| {});
        assert!(c.machine(J1).is_some());
        assert!(c.machine(IntersectionId(1)).is_none());
        assert_eq!(c.corridor().intersection_count(), 1);
    }

    #[test]
    fn zero_step_rejected() {
        let controller = ControllerConfig { step_length_secs: 0.0, ..ControllerConfig::default() };
        let result = ControlLoopBuilder::new(junction(), controller, RunConfig::default()).build();
        assert!(matches!(result, Err(SimError::Core(_))));
    }

    #[test]
    fn zero_flush_interval_rejected() {
        let run = RunConfig { flush_interval_ticks: 0, ..RunConfig::default() };
        let result = ControlLoopBuilder::new(junction(), ControllerConfig::default(), run).build();
        assert!(matches!(result, Err(SimError::Core(_))));
    }

    #[test]
    fn empty_corridor_rejected() {
        let corridor = CorridorBuilder::new().build().unwrap();
        let result =
            ControlLoopBuilder::new(corridor, ControllerConfig::default(), RunConfig::default()).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn timings_off_the_control_period_rejected() {
        let controller = ControllerConfig { control_interval_ticks: 5, ..ControllerConfig::default() };
        let result =
            ControlLoopBuilder::new(junction_with(5.0, 22.0, 5.0), controller, RunConfig::default()).build();
        match result {
            Err(SimError::Config(msg)) => {
                assert!(msg.contains("J1"), "{msg}");
                assert!(msg.contains("phases[0]"), "{msg}");
                assert!(msg.contains("max_green"), "{msg}");
            }
            Err(other) => panic!("expected SimError::Config, got {other:?}"),
            Ok(_) => panic!("expected SimError::Config, got a control loop"),
        }
    }

    #[test]
    fn timings_off_the_step_allowed_without_control_interval() {
        let c = ControlLoopBuilder::new(
            junction_with(5.0, 22.0, 2.0),
            ControllerConfig::default(),
            RunConfig::default(),
        )
        .build();
        assert!(c.is_ok());
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn runs_to_end_time_and_cycles_on_max_green() {
        let mut c = control(30.0, |_, _| {});
        let (sim, probe) = ScriptedSim::new(Script::default());
        let mut obs = Collector::default();
        let summary = c.run(sim, &mut obs).unwrap();

        assert_eq!(summary.ticks, 30);
        assert_eq!(summary.final_time, secs(30));
        assert!(!summary.cancelled);
        // Green(0) hits max green at 20 s, clears for 2 s.
        assert_eq!(probe.commands(), vec![(secs(22), J1, PhaseIndex(1))]);
        assert_eq!(summary.switches["J1"], 1);
        assert_eq!(obs.records.len(), 30);
        assert_eq!(obs.ended.as_ref(), Some(&summary));
        assert!(probe.closed.load(Ordering::Relaxed));
    }

    #[test]
    fn pressure_switch_waits_for_min_green() {
        let mut c = control(10.0, |_, _| {});
        let (sim, probe) = ScriptedSim::new(Script { queues: vec![0, 10], ..Script::default() });
        let mut obs = Collector::default();
        c.run(sim, &mut obs).unwrap();

        assert_eq!(obs.switches.len(), 1);
        assert_eq!(obs.switches[0].at, secs(5));
        assert_eq!(probe.commands(), vec![(secs(7), J1, PhaseIndex(1))]);

        let clearing: Vec<_> = obs.records.iter().filter(|r| r.clearing).map(|r| r.sim_time).collect();
        assert_eq!(clearing, vec![secs(5), secs(6)]);
    }

    #[test]
    fn records_carry_lane_pressures() {
        let mut c = control(3.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script { queues: vec![4, 7], ..Script::default() });
        let mut obs = Collector::default();
        c.run(sim, &mut obs).unwrap();

        let first = &obs.records[0];
        assert_eq!(first.tick, Tick(1));
        assert_eq!(first.sim_time, secs(1));
        let pressures: Vec<_> = first.lane_pressures.iter().map(|p| (p.lane, p.pressure)).collect();
        assert_eq!(pressures, vec![(A, 4.0), (B, 7.0)]);
    }

    #[test]
    fn telemetry_gap_warns_once_and_run_continues() {
        let mut c = control(15.0, |_, _| {});
        let script = Script { silent: Some((B, secs(3), secs(8))), ..Script::default() };
        let (sim, _) = ScriptedSim::new(script);
        let mut obs = Collector::default();
        let summary = c.run(sim, &mut obs).unwrap();

        assert_eq!(summary.ticks, 15);
        assert_eq!(summary.degraded_evals, 6);
        assert_eq!(obs.warnings.len(), 1);
        let w = &obs.warnings[0];
        assert_eq!(w.at, secs(5));
        assert_eq!(w.consecutive_ticks, 3);
        assert_eq!(w.missing_lanes, vec![B]);
        assert_eq!(summary.warnings, obs.warnings);
    }

    #[test]
    fn each_monitored_lane_queried_once_per_evaluation() {
        let mut c = control(10.0, |_, _| {});
        let (sim, probe) = ScriptedSim::new(Script::default());
        c.run(sim, &mut NoopObserver).unwrap();
        assert_eq!(probe.queries.load(Ordering::Relaxed), 20);
    }

    #[test]
    fn control_interval_evaluates_every_kth_tick() {
        let mut c = control_on(junction_with(5.0, 20.0, 5.0), 30.0, |ctl, _| ctl.control_interval_ticks = 5);
        let (sim, probe) = ScriptedSim::new(Script::default());
        let mut obs = Collector::default();
        c.run(sim, &mut obs).unwrap();

        let times: Vec<_> = obs.records.iter().map(|r| r.sim_time).collect();
        assert_eq!(times, vec![secs(5), secs(10), secs(15), secs(20), secs(25), secs(30)]);
        let ticks: Vec<_> = obs.records.iter().map(|r| r.tick.0).collect();
        assert_eq!(ticks, vec![5, 10, 15, 20, 25, 30]);
        // Max green at 20 s; the 5 s clearance takes exactly one period.
        assert_eq!(probe.commands(), vec![(secs(25), J1, PhaseIndex(1))]);
        assert_eq!(probe.queries.load(Ordering::Relaxed), 12);
    }

    #[test]
    fn control_interval_switches_exactly_at_max_green() {
        let mut c = control_on(junction_with(5.0, 25.0, 5.0), 60.0, |ctl, _| ctl.control_interval_ticks = 5);
        let (sim, _) = ScriptedSim::new(Script::default());
        let mut obs = Collector::default();
        c.run(sim, &mut obs).unwrap();

        assert!(!obs.switches.is_empty());
        for s in &obs.switches {
            assert_eq!(s.elapsed_green, SimDuration::from_secs(25), "{s:?}");
        }
        assert_eq!(obs.switches[0].at, secs(25));
    }

    #[test]
    fn record_tick_matches_summary_ticks() {
        let mut c = control(12.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script::default());
        let mut obs = Collector::default();
        let summary = c.run(sim, &mut obs).unwrap();

        let last = obs.records.last().unwrap();
        assert_eq!(last.tick, Tick(summary.ticks));
        assert_eq!(last.sim_time, summary.final_time);
        for r in &obs.records {
            assert_eq!(SimTime::from_secs(r.tick.0), r.sim_time);
        }
    }

    #[test]
    fn records_flushed_at_interval() {
        let mut c = control(25.0, |_, run| run.flush_interval_ticks = 10);
        let (sim, _) = ScriptedSim::new(Script::default());
        let mut obs = Collector::default();
        c.run(sim, &mut obs).unwrap();
        // 10, 20, then the remainder at run end.
        assert_eq!(obs.flushes, 3);
        assert_eq!(obs.records.len(), 25);
    }

    #[test]
    fn cancel_stops_at_next_tick_boundary() {
        let mut c = control(100.0, |_, _| {});
        let token = c.cancel_token();
        let (sim, probe) = ScriptedSim::new(Script::default());
        let mut obs = Collector { cancel_after: Some((Tick(10), token)), ..Collector::default() };
        let summary = c.run(sim, &mut obs).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.final_time, secs(10));
        assert_eq!(obs.records.len(), 10);
        assert!(obs.ended.is_some());
        assert!(probe.closed.load(Ordering::Relaxed));
    }
}

// ── Failure handling ──────────────────────────────────────────────────────────

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn disconnect_aborts_with_last_good_time_and_flushes() {
        let mut c = control(60.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script { disconnect_at: Some(secs(10)), ..Script::default() });
        let mut obs = Collector::default();
        let err = c.run(sim, &mut obs).unwrap_err();

        assert!(
            matches!(
                &err,
                SimError::Aborted { last_good, source: AdapterError::SimulatorUnavailable { .. } }
                    if *last_good == secs(10)
            ),
            "{err:?}"
        );
        assert_eq!(obs.records.len(), 10);
        assert!(obs.ended.is_none());
    }

    #[test]
    fn desync_aborts() {
        let mut c = control(60.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script { skip_at: Some(secs(5)), ..Script::default() });
        let err = c.run(sim, &mut NoopObserver).unwrap_err();
        match err {
            SimError::Aborted { last_good, source } => {
                assert_eq!(last_good, secs(5));
                assert_eq!(source, AdapterError::SimulatorDesync { expected: secs(6), got: secs(7) });
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn hung_simulator_times_out() {
        let mut c = control(60.0, |_, run| run.advance_timeout_ms = 100);
        let (sim, _) = ScriptedSim::new(Script { hang_at: Some(secs(3)), ..Script::default() });
        let err = c.run(sim, &mut NoopObserver).unwrap_err();
        assert!(
            matches!(
                &err,
                SimError::Aborted { last_good, source: AdapterError::SimulatorUnavailable { .. } }
                    if *last_good == secs(3)
            ),
            "{err:?}"
        );
    }

    #[test]
    fn unknown_lane_is_contract_violation() {
        let mut c = control(60.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script { lane_count: 1, ..Script::default() });
        let err = c.run(sim, &mut NoopObserver).unwrap_err();
        match err {
            SimError::Contract { at, source } => {
                assert_eq!(at, secs(1));
                assert_eq!(source, AdapterError::UnknownLane(B));
            }
            other => panic!("expected Contract, got {other:?}"),
        }
    }

    #[test]
    fn invalid_phase_is_contract_violation() {
        let mut c = control(60.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script { phase_counts: vec![1], ..Script::default() });
        let err = c.run(sim, &mut NoopObserver).unwrap_err();
        match err {
            SimError::Contract { at, source } => {
                assert_eq!(at, secs(22));
                assert_eq!(
                    source,
                    AdapterError::InvalidPhaseIndex { intersection: J1, phase: PhaseIndex(1), phase_count: 1 }
                );
            }
            other => panic!("expected Contract, got {other:?}"),
        }
    }

    #[test]
    fn refused_connection_is_connect_error() {
        let mut c = control(60.0, |_, _| {});
        let (sim, _) = ScriptedSim::new(Script { refuse: true, ..Script::default() });
        let err = c.run(sim, &mut NoopObserver).unwrap_err();
        assert!(matches!(err, SimError::Connect(AdapterError::SimulatorUnavailable { .. })));
    }
}

// ── ClockAdapter ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod adapter_tests {
    use super::*;

    const STEP: SimDuration = SimDuration::from_secs(1);

    #[test]
    fn advance_confirms_time() {
        let (sim, _) = ScriptedSim::new(Script::default());
        let mut adapter = ClockAdapter::connect(sim, STEP, Duration::from_secs(5)).unwrap();
        assert_eq!(adapter.now(), SimTime::ZERO);
        assert_eq!(adapter.advance().unwrap(), secs(1));
        assert_eq!(adapter.advance().unwrap(), secs(2));
        assert_eq!(adapter.tick(), Tick(2));
    }

    #[test]
    fn timeout_poisons_adapter() {
        let (sim, _) = ScriptedSim::new(Script { hang_at: Some(SimTime::ZERO), ..Script::default() });
        let mut adapter = ClockAdapter::connect(sim, STEP, Duration::from_millis(100)).unwrap();
        let first = adapter.advance().unwrap_err();
        assert!(matches!(first, AdapterError::SimulatorUnavailable { .. }));
        assert!(adapter.is_poisoned());
        // Fails fast with the same reason; the worker is never consulted.
        assert_eq!(adapter.query_lane(A).unwrap_err(), first);
        assert_eq!(adapter.now(), SimTime::ZERO);
    }

    #[test]
    fn missing_reading_is_not_an_error() {
        let script = Script { silent: Some((A, SimTime::ZERO, secs(1))), ..Script::default() };
        let (sim, _) = ScriptedSim::new(script);
        let mut adapter = ClockAdapter::connect(sim, STEP, Duration::from_secs(5)).unwrap();
        assert_eq!(adapter.query_lane(A).unwrap(), None);
        assert!(adapter.query_lane(B).unwrap().is_some());
    }

    #[test]
    fn close_releases_backend() {
        let (sim, probe) = ScriptedSim::new(Script::default());
        let adapter = ClockAdapter::connect(sim, STEP, Duration::from_secs(5)).unwrap();
        adapter.close();
        assert!(probe.closed.load(Ordering::Relaxed));
    }

    #[test]
    fn drop_releases_backend() {
        let (sim, probe) = ScriptedSim::new(Script::default());
        {
            let mut adapter = ClockAdapter::connect(sim, STEP, Duration::from_secs(5)).unwrap();
            adapter.advance().unwrap();
        }
        assert!(probe.closed.load(Ordering::Relaxed));
    }
}

// ── PointQueueSimulator ───────────────────────────────────────────────────────

#[cfg(test)]
mod point_queue_tests {
    use super::*;

    const STEP: SimDuration = SimDuration::from_secs(1);

    fn quiet() -> PointQueueConfig {
        PointQueueConfig { arrival_rate_per_hour: 0.0, ..PointQueueConfig::default() }
    }

    /// J1 (phase 0: `main_in → link`, phase 1: `side_in`) feeding
    /// J2 (phase 0: `cross`, phase 1: `link → exit`).
    fn two_junctions() -> Corridor {
        let mut b = CorridorBuilder::new();
        let main_in = b.add_lane("main_in");
        let side_in = b.add_lane("side_in");
        let link = b.add_lane("link");
        let cross = b.add_lane("cross");
        let exit = b.add_lane("exit");
        b.add_intersection("J1", vec![spec(main_in, vec![link], 5.0, 30.0), spec(side_in, vec![], 5.0, 30.0)]);
        b.add_intersection("J2", vec![spec(cross, vec![], 5.0, 30.0), spec(link, vec![exit], 5.0, 30.0)]);
        b.build().unwrap()
    }

    #[test]
    fn phase_request_applies_on_next_step() {
        let mut sim = PointQueueSimulator::new(&junction(), &quiet()).unwrap();
        sim.set_phase(J1, PhaseIndex(1)).unwrap();
        assert_eq!(sim.active_phase(J1), Some(PhaseIndex(0)));
        sim.step(STEP).unwrap();
        assert_eq!(sim.active_phase(J1), Some(PhaseIndex(1)));
    }

    #[test]
    fn green_lane_discharges_red_lane_holds() {
        let mut sim = PointQueueSimulator::new(&junction(), &quiet()).unwrap();
        sim.seed_queue(A, 10);
        sim.seed_queue(B, 10);
        for _ in 0..10 {
            sim.step(STEP).unwrap();
        }
        // 1 800 veh/h = one vehicle every 2 s.
        assert_eq!(sim.queue(A), Some(5));
        assert_eq!(sim.queue(B), Some(10));
    }

    #[test]
    fn full_downstream_lane_blocks_discharge() {
        let corridor = two_junctions();
        let cfg = PointQueueConfig { lane_capacity: 3, ..quiet() };
        let mut sim = PointQueueSimulator::new(&corridor, &cfg).unwrap();
        let main_in = corridor.lane_id("main_in").unwrap();
        let link = corridor.lane_id("link").unwrap();
        sim.seed_queue(main_in, 3);
        sim.seed_queue(link, 3);
        for _ in 0..10 {
            sim.step(STEP).unwrap();
        }
        assert_eq!(sim.queue(main_in), Some(3));
        assert_eq!(sim.queue(link), Some(3));
    }

    #[test]
    fn telemetry_reflects_queue() {
        let cfg = PointQueueConfig { lane_capacity: 20, ..quiet() };
        let mut sim = PointQueueSimulator::new(&junction(), &cfg).unwrap();
        sim.seed_queue(B, 5);
        let s = sim.lane_state(B).unwrap().unwrap();
        assert_eq!(s.queue_length, 5);
        assert!((s.occupancy - 0.25).abs() < 1e-12);
    }

    #[test]
    fn faults_for_unknown_lane_and_phase() {
        let mut sim = PointQueueSimulator::new(&junction(), &quiet()).unwrap();
        assert_eq!(sim.lane_state(LaneId(9)), Err(SimulatorFault::UnknownLane(LaneId(9))));
        assert!(matches!(
            sim.set_phase(J1, PhaseIndex(2)),
            Err(SimulatorFault::PhaseOutOfRange { phase_count: 2, .. })
        ));
        assert!(matches!(
            sim.set_phase(IntersectionId(4), PhaseIndex(0)),
            Err(SimulatorFault::UnknownIntersection(_))
        ));
    }

    #[test]
    fn dead_lane_never_reports() {
        let cfg = PointQueueConfig { dead_lanes: vec!["b".into()], ..quiet() };
        let mut sim = PointQueueSimulator::new(&junction(), &cfg).unwrap();
        assert_eq!(sim.lane_state(B).unwrap(), None);
        assert!(sim.lane_state(A).unwrap().is_some());
    }

    #[test]
    fn scripted_disconnect() {
        let cfg = PointQueueConfig { disconnect_after_secs: Some(2), ..quiet() };
        let mut sim = PointQueueSimulator::new(&junction(), &cfg).unwrap();
        sim.step(STEP).unwrap();
        sim.step(STEP).unwrap();
        assert!(matches!(sim.step(STEP), Err(SimulatorFault::Disconnected(_))));
    }

    #[test]
    fn invalid_config_rejected() {
        let bad = PointQueueConfig { dropout_probability: 1.5, ..PointQueueConfig::default() };
        assert!(PointQueueSimulator::new(&junction(), &bad).is_err());
        let unknown = PointQueueConfig { dead_lanes: vec!["zz".into()], ..PointQueueConfig::default() };
        assert!(PointQueueSimulator::new(&junction(), &unknown).is_err());
    }

    #[test]
    fn same_seed_same_run() {
        let run_once = || {
            let corridor = two_junctions();
            let cfg = PointQueueConfig { seed: 7, arrival_rate_per_hour: 900.0, ..PointQueueConfig::default() };
            let sim = PointQueueSimulator::new(&corridor, &cfg).unwrap();
            let run = RunConfig { end_time_secs: 600.0, ..RunConfig::default() };
            let mut c = ControlLoopBuilder::new(corridor, ControllerConfig::default(), run)
                .build()
                .unwrap();
            let mut obs = Collector::default();
            let summary = c.run(sim, &mut obs).unwrap();
            (summary, obs.records)
        };

        let (s1, r1) = run_once();
        let (s2, r2) = run_once();
        assert_eq!(s1.ticks, 600);
        assert_eq!(r1.len(), 1_200);
        assert!(s1.total_switches() > 0);
        assert_eq!(s1, s2);
        assert_eq!(r1, r2);
    }
}
