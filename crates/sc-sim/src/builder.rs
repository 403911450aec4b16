//! Fluent builder for constructing a [`ControlLoop`].

use std::collections::BTreeMap;

use log::info;

use sc_control::{PhaseStateMachine, PressureEstimator};
use sc_core::{ControllerConfig, RunConfig, SimDuration};
use sc_network::Corridor;

use crate::{CancelToken, ControlLoop, SimError, SimResult};

/// Fluent builder for [`ControlLoop`].
///
/// # Required inputs
///
/// - [`Corridor`]: the validated network; one state machine per intersection
/// - [`ControllerConfig`]: step length, threshold, α, warning streak, …
/// - [`RunConfig`]: end time, flush interval, adapter timeout, …
///
/// # Optional inputs
///
/// | Method              | Default                       |
/// |---------------------|-------------------------------|
/// | `.cancel_token(t)`  | A fresh, never-cancelled token |
///
/// # Example
///
/// ```rust,ignore
/// let cancel = CancelToken::new();
/// let mut control = ControlLoopBuilder::new(corridor, controller, run)
///     .cancel_token(cancel.clone())
///     .build()?;
/// control.run(simulator, &mut NoopObserver)?;
/// ```
pub struct ControlLoopBuilder {
    corridor:   Corridor,
    controller: ControllerConfig,
    run:        RunConfig,
    cancel:     Option<CancelToken>,
}

impl ControlLoopBuilder {
    pub fn new(corridor: Corridor, controller: ControllerConfig, run: RunConfig) -> Self {
        Self { corridor, controller, run, cancel: None }
    }

    /// Share a cancellation token with the caller.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate configuration and create one state machine per intersection.
    ///
    /// # Errors
    ///
    /// - [`SimError::Core`] if either config fails validation.
    /// - [`SimError::Config`] if the corridor has no intersections, or if
    ///   `control_interval_ticks > 1` and a phase timing is not a whole
    ///   number of control periods.
    pub fn build(self) -> SimResult<ControlLoop> {
        self.controller.validate()?;
        self.run.validate()?;
        if self.corridor.intersection_count() == 0 {
            return Err(SimError::Config("corridor has no intersections".into()));
        }

        let step = self.controller.step_length()?;
        if self.controller.control_interval_ticks > 1 {
            check_period_alignment(&self.corridor, self.controller.control_period()?)?;
        }
        let end_time = self.run.end_time()?;
        let machines: BTreeMap<_, _> = self
            .corridor
            .intersections()
            .iter()
            .map(|j| (j.id, PhaseStateMachine::from_config(j, &self.controller)))
            .collect();

        info!(
            "control loop ready: {} intersection(s), {} lane(s), step {step}, control every {} tick(s)",
            machines.len(),
            self.corridor.lane_count(),
            self.controller.control_interval_ticks
        );

        Ok(ControlLoop {
            estimator: PressureEstimator::from_config(&self.controller),
            monitored: self.corridor.monitored_lanes(self.controller.downstream_weight > 0.0),
            corridor: self.corridor,
            machines,
            step,
            control_every: self.controller.control_interval_ticks.max(1),
            end_time,
            run: self.run,
            cancel: self.cancel.unwrap_or_default(),
            buffer: Vec::new(),
        })
    }
}

/// Machines only observe time in whole control periods, so timing bounds
/// that fall between evaluations would overshoot.  Each phase's min green,
/// max green and clearance must be a multiple of `period`.
fn check_period_alignment(corridor: &Corridor, period: SimDuration) -> SimResult<()> {
    for junction in corridor.intersections() {
        for (index, phase) in junction.indexed_phases() {
            for (field, value) in [
                ("min_green", phase.min_green),
                ("max_green", phase.max_green),
                ("clearance", phase.clearance),
            ] {
                if !value.as_millis().is_multiple_of(period.as_millis()) {
                    return Err(SimError::Config(format!(
                        "intersection {:?} phases[{}]: {field} {value} is not a multiple \
                         of the control period {period}",
                        junction.name,
                        index.index()
                    )));
                }
            }
        }
    }
    Ok(())
}
