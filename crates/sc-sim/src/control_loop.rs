//! The `ControlLoop` struct and its tick loop.

use std::collections::BTreeMap;

use log::{debug, error, info};

use sc_control::{PhaseStateMachine, PressureEstimator, TickOutcome};
use sc_core::{IntersectionId, LaneId, LaneState, RunConfig, SimDuration, SimTime, Tick};
use sc_network::Corridor;

use crate::{
    CancelToken, ClockAdapter, RunObserver, RunSummary, SimError, SimResult, Simulator, TickRecord,
};

/// One tick's lane readings, keyed by lane.  Lanes that produced no
/// telemetry are absent.
#[cfg(not(feature = "fx-hash"))]
pub type LaneSnapshot = std::collections::HashMap<LaneId, LaneState>;

#[cfg(feature = "fx-hash")]
pub type LaneSnapshot = rustc_hash::FxHashMap<LaneId, LaneState>;

/// What one machine decided, carried from the decide phase to the apply
/// phase.
struct Decision {
    intersection: IntersectionId,
    outcome:      TickOutcome,
    record:       TickRecord,
}

// ── ControlLoop ───────────────────────────────────────────────────────────────

/// The corridor controller.
///
/// Owns one [`PhaseStateMachine`] per intersection and drives them against a
/// [`Simulator`] through a [`ClockAdapter`]:
///
/// 1. **Advance** the simulator one step and confirm its clock.
/// 2. **Snapshot**: on evaluation ticks, query every monitored lane once.
/// 3. **Decide**: score and tick every machine against the same snapshot
///    (optionally parallel with the `parallel` feature).
/// 4. **Apply** (sequential, ascending `IntersectionId`): send phase
///    commands, report switches and warnings, buffer tick records.
///
/// Create via [`ControlLoopBuilder`][crate::ControlLoopBuilder].
pub struct ControlLoop {
    pub(crate) corridor:      Corridor,
    pub(crate) machines:      BTreeMap<IntersectionId, PhaseStateMachine>,
    pub(crate) estimator:     PressureEstimator,
    /// Every lane read in a snapshot, sorted.
    pub(crate) monitored:     Vec<LaneId>,
    pub(crate) step:          SimDuration,
    pub(crate) control_every: u32,
    pub(crate) end_time:      SimTime,
    pub(crate) run:           RunConfig,
    pub(crate) cancel:        CancelToken,
    /// Tick records awaiting the next flush.
    pub(crate) buffer:        Vec<TickRecord>,
}

impl ControlLoop {
    // ── Public API ────────────────────────────────────────────────────────

    pub fn corridor(&self) -> &Corridor {
        &self.corridor
    }

    pub fn machine(&self, intersection: IntersectionId) -> Option<&PhaseStateMachine> {
        self.machines.get(&intersection)
    }

    /// A handle that stops this loop at its next tick boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Connect to `simulator` and run until `end_time`, cancellation, or the
    /// first fatal error.
    ///
    /// The simulator connection is closed and buffered tick records are
    /// flushed to `observer` on every exit path.  Controller state persists
    /// in `self` afterwards for inspection.
    ///
    /// # Errors
    ///
    /// - [`SimError::Connect`] if the simulator cannot be reached at all.
    /// - [`SimError::Aborted`] on `SimulatorUnavailable` or `SimulatorDesync`.
    /// - [`SimError::Contract`] on `UnknownLane` or `InvalidPhaseIndex`.
    pub fn run<S: Simulator, O: RunObserver>(
        &mut self,
        simulator: S,
        observer:  &mut O,
    ) -> SimResult<RunSummary> {
        let mut adapter = ClockAdapter::connect(simulator, self.step, self.run.advance_timeout())
            .map_err(SimError::Connect)?;
        info!("run started at {}, ends at {}", adapter.now(), self.end_time);

        let mut summary = RunSummary {
            switches: self
                .corridor
                .intersections()
                .iter()
                .map(|j| (j.name.clone(), 0))
                .collect(),
            ..RunSummary::default()
        };

        let result = self.drive(&mut adapter, observer, &mut summary);
        self.flush(observer);

        match result {
            Ok(()) => {
                adapter.close();
                info!(
                    "run finished at {} after {} ticks: {} switch(es), {} warning(s){}",
                    summary.final_time,
                    summary.ticks,
                    summary.total_switches(),
                    summary.warnings.len(),
                    if summary.cancelled { " (cancelled)" } else { "" }
                );
                observer.on_run_end(&summary);
                Ok(summary)
            }
            Err(e) => {
                error!("run stopped after {} ticks: {e}", summary.ticks);
                Err(e)
            }
        }
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    fn drive<O: RunObserver>(
        &mut self,
        adapter:  &mut ClockAdapter,
        observer: &mut O,
        summary:  &mut RunSummary,
    ) -> SimResult<()> {
        let dt = self.step.times(self.control_every as u64);
        let progress_ms = self.run.progress_interval_secs.saturating_mul(1_000);

        loop {
            if self.cancel.is_cancelled() {
                info!("cancellation requested; stopping at {}", adapter.now());
                summary.cancelled = true;
                return Ok(());
            }
            let last_good = adapter.now();
            if last_good >= self.end_time {
                return Ok(());
            }

            // Ticks are numbered by the step that completes them.
            let tick = adapter.tick().offset(1);
            observer.on_tick_start(tick);

            let now = adapter
                .advance()
                .map_err(|e| SimError::from_adapter(last_good, e))?;
            summary.ticks += 1;
            summary.final_time = now;

            if tick.0.is_multiple_of(self.control_every as u64) {
                let snapshot = self.snapshot(adapter)?;
                let decisions = self.decide(tick, now, dt, &snapshot)?;
                self.apply(adapter, now, decisions, observer, summary)?;
            }

            observer.on_tick_end(tick, now);

            if tick.0.is_multiple_of(self.run.flush_interval_ticks) {
                self.flush(observer);
            }
            if progress_ms > 0 && now.as_millis() / progress_ms != last_good.as_millis() / progress_ms {
                info!(
                    "simulated {now} ({tick}): {} switch(es) so far",
                    summary.total_switches()
                );
            }
        }
    }

    /// Query every monitored lane exactly once.
    fn snapshot(&self, adapter: &mut ClockAdapter) -> SimResult<LaneSnapshot> {
        let now = adapter.now();
        let mut snapshot = LaneSnapshot::default();
        snapshot.reserve(self.monitored.len());
        for &lane in &self.monitored {
            let reading = adapter
                .query_lane(lane)
                .map_err(|e| SimError::from_adapter(now, e))?;
            match reading {
                Some(state) => {
                    snapshot.insert(lane, state);
                }
                None => debug!(
                    "{} ({lane}): no telemetry at {now}",
                    self.corridor.lane_name(lane).unwrap_or("?")
                ),
            }
        }
        Ok(snapshot)
    }

    /// Score and tick every machine.
    ///
    /// Machines share nothing mutable, so with the `parallel` feature they
    /// run on Rayon's pool.  Results are sorted by intersection afterwards so
    /// the apply phase sees the same order either way.
    fn decide(
        &mut self,
        tick:     Tick,
        now:      SimTime,
        dt:       SimDuration,
        snapshot: &LaneSnapshot,
    ) -> SimResult<Vec<Decision>> {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let corridor = &self.corridor;
        let estimator = self.estimator;

        let evaluate = |(&id, machine): (&IntersectionId, &mut PhaseStateMachine)| -> SimResult<Decision> {
            let junction = corridor
                .intersection(id)
                .ok_or_else(|| SimError::Config(format!("no intersection {id} in corridor")))?;
            let scores = estimator.score_all(junction, snapshot);
            let outcome = machine.tick(junction, now, dt, &scores)?;
            let signal = machine.state().signal;
            Ok(Decision {
                intersection: id,
                record: TickRecord {
                    tick,
                    sim_time:       now,
                    intersection:   id,
                    active_phase:   signal.active_phase(),
                    clearing:       signal.is_clearing(),
                    degraded:       outcome.degraded,
                    lane_pressures: estimator.lane_breakdown(junction, snapshot),
                },
                outcome,
            })
        };

        #[cfg(not(feature = "parallel"))]
        let mut decisions = self
            .machines
            .iter_mut()
            .map(evaluate)
            .collect::<SimResult<Vec<_>>>()?;

        #[cfg(feature = "parallel")]
        let mut decisions = {
            use rayon::prelude::*;
            self.machines
                .par_iter_mut()
                .map(evaluate)
                .collect::<SimResult<Vec<_>>>()?
        };

        decisions.sort_unstable_by_key(|d| d.intersection);
        Ok(decisions)
    }

    fn apply<O: RunObserver>(
        &mut self,
        adapter:   &mut ClockAdapter,
        now:       SimTime,
        decisions: Vec<Decision>,
        observer:  &mut O,
        summary:   &mut RunSummary,
    ) -> SimResult<()> {
        for Decision { intersection, outcome, record } in decisions {
            if outcome.degraded {
                summary.degraded_evals += 1;
            }
            if let Some(warning) = outcome.warning {
                observer.on_warning(&warning);
                summary.warnings.push(warning);
            }
            if let Some(event) = &outcome.switch {
                observer.on_switch(event);
                if let Some(j) = self.corridor.intersection(intersection) {
                    *summary.switches.entry(j.name.clone()).or_default() += 1;
                }
            }
            if let Some(cmd) = outcome.command {
                adapter
                    .apply_phase(cmd.intersection, cmd.phase)
                    .map_err(|e| SimError::from_adapter(now, e))?;
            }
            self.buffer.push(record);
        }
        Ok(())
    }

    fn flush<O: RunObserver>(&mut self, observer: &mut O) {
        if !self.buffer.is_empty() {
            observer.on_flush(std::mem::take(&mut self.buffer));
        }
    }
}
