//! Controller and run configuration.
//!
//! Typically loaded from the `controller` and `run` sections of a scenario
//! JSON file by the application crate (with the `serde` feature) and passed
//! to the control loop builder.  Every field has a default, so a config file
//! only needs to name what it changes.
//!
//! Seconds are accepted as `f64` for readability and converted to
//! [`SimDuration`] milliseconds by the accessor methods, which also validate.

use crate::{CoreError, CoreResult, SimDuration, SimTime};

// ── ControllerConfig ──────────────────────────────────────────────────────────

/// Tuning for the max-pressure controller.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    /// Simulated seconds advanced per tick.  Must be a positive whole number
    /// of milliseconds.  Default: 1.0.
    pub step_length_secs: f64,

    /// Hysteresis margin: an alternative phase must out-score the active one
    /// by at least this much before an early (pre-max-green) switch.
    /// Default: 3.0.
    pub pressure_threshold: f64,

    /// Weight α applied to free downstream capacity.  0 disables outgoing-lane
    /// tracking entirely.  Default: 0.0.
    pub downstream_weight: f64,

    /// Consecutive degraded ticks at one intersection before a
    /// `TelemetryGapWarning` is raised.  Default: 3.
    pub degraded_ticks_before_warning: u32,

    /// Evaluate the controllers on every k-th tick only.  Default: 1.
    pub control_interval_ticks: u32,

    /// Phase timing used when a phase definition omits its own.
    pub default_min_green_secs: f64,
    pub default_max_green_secs: f64,
    pub default_clearance_secs: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            step_length_secs:              1.0,
            pressure_threshold:            3.0,
            downstream_weight:             0.0,
            degraded_ticks_before_warning: 3,
            control_interval_ticks:        1,
            default_min_green_secs:        25.0,
            default_max_green_secs:        60.0,
            default_clearance_secs:        4.0,
        }
    }
}

impl ControllerConfig {
    /// The validated step length.
    pub fn step_length(&self) -> CoreResult<SimDuration> {
        let step = SimDuration::from_secs_f64(self.step_length_secs).ok_or_else(|| {
            CoreError::Config(format!(
                "step_length_secs must be a finite, non-negative number (got {})",
                self.step_length_secs
            ))
        })?;
        if step.is_zero() {
            return Err(CoreError::Config("step_length_secs must be positive".into()));
        }
        let exact_ms = self.step_length_secs * 1_000.0;
        if (exact_ms - step.as_millis() as f64).abs() > 1e-6 {
            return Err(CoreError::Config(format!(
                "step_length_secs must be a whole number of milliseconds (got {})",
                self.step_length_secs
            )));
        }
        Ok(step)
    }

    /// Simulated time between two controller evaluations.
    pub fn control_period(&self) -> CoreResult<SimDuration> {
        Ok(self.step_length()?.times(self.control_interval_ticks as u64))
    }

    /// Check every field.  Call once at startup; never mid-run.
    pub fn validate(&self) -> CoreResult<()> {
        self.step_length()?;

        if !self.pressure_threshold.is_finite() || self.pressure_threshold < 0.0 {
            return Err(CoreError::Config(format!(
                "pressure_threshold must be finite and >= 0 (got {})",
                self.pressure_threshold
            )));
        }
        if !self.downstream_weight.is_finite() || self.downstream_weight < 0.0 {
            return Err(CoreError::Config(format!(
                "downstream_weight must be finite and >= 0 (got {})",
                self.downstream_weight
            )));
        }
        if self.degraded_ticks_before_warning == 0 {
            return Err(CoreError::Config(
                "degraded_ticks_before_warning must be at least 1".into(),
            ));
        }
        if self.control_interval_ticks == 0 {
            return Err(CoreError::Config("control_interval_ticks must be at least 1".into()));
        }
        for (name, v) in [
            ("default_min_green_secs", self.default_min_green_secs),
            ("default_max_green_secs", self.default_max_green_secs),
            ("default_clearance_secs", self.default_clearance_secs),
        ] {
            if SimDuration::from_secs_f64(v).is_none() {
                return Err(CoreError::Config(format!(
                    "{name} must be finite and >= 0 (got {v})"
                )));
            }
        }
        Ok(())
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Run-level options: horizon, telemetry hand-off, and simulator timeout.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    /// Simulated time at which the run stops.  Default: 86 400 (one day).
    pub end_time_secs: f64,

    /// Hand buffered tick records to the metrics collector every N ticks.
    /// Default: 60.
    pub flush_interval_ticks: u64,

    /// Longest the controller waits for any simulator call before treating
    /// the simulator as unavailable.  Default: 5 000 ms.
    pub advance_timeout_ms: u64,

    /// Log simulated-time progress every N simulated seconds.  0 disables.
    /// Default: 3 600.
    pub progress_interval_secs: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            end_time_secs:          86_400.0,
            flush_interval_ticks:   60,
            advance_timeout_ms:     5_000,
            progress_interval_secs: 3_600,
        }
    }
}

impl RunConfig {
    /// The simulated time at which the run ends (inclusive: the tick that
    /// reaches it is the last one processed).
    pub fn end_time(&self) -> CoreResult<SimTime> {
        SimDuration::from_secs_f64(self.end_time_secs)
            .map(|d| SimTime::ZERO + d)
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "end_time_secs must be finite and >= 0 (got {})",
                    self.end_time_secs
                ))
            })
    }

    pub fn advance_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.advance_timeout_ms)
    }

    pub fn validate(&self) -> CoreResult<()> {
        self.end_time()?;
        if self.flush_interval_ticks == 0 {
            return Err(CoreError::Config("flush_interval_ticks must be at least 1".into()));
        }
        if self.advance_timeout_ms == 0 {
            return Err(CoreError::Config("advance_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
