//! The per-intersection phase state machine.
//!
//! # Transition rule (once per evaluation tick)
//!
//! ```text
//! Clearing(p → p', r):  r ← r − dt;  r = 0 ⇒ Green(p'), elapsed ← 0, command p'
//! Green(p):             elapsed ← elapsed + dt, then
//!   elapsed <  min_green(p)  → hold
//!   elapsed >= max_green(p)  → Clearing(p → best p' ≠ p), or next in cycle
//!                              order if no alternative has positive pressure
//!   score(p') − score(p) >= threshold → Clearing(p → p')
//!   otherwise                → hold
//! ```
//!
//! Elapsed time is accumulated *before* the decision, so a machine that went
//! green at `t0` and is evaluated at `t` sees `elapsed = t − t0`.

use log::{debug, warn};

use sc_core::{ControllerConfig, IntersectionId, PhaseIndex, SimDuration, SimTime};
use sc_network::Intersection;

use crate::event::{PhaseCommand, SwitchEvent, SwitchReason, TelemetryGapWarning, TickOutcome};
use crate::{ControlError, ControlResult, ControllerState, PhaseScores, SignalState};

/// Controller for one intersection.
///
/// Owns its [`ControllerState`] exclusively; nothing else mutates it.  The
/// intersection model is passed in on every tick rather than stored, so
/// machines can live in an owning map next to a shared, read-only corridor.
#[derive(Clone, Debug)]
pub struct PhaseStateMachine {
    intersection:  IntersectionId,
    phase_count:   usize,
    threshold:     f64,
    warn_after:    u32,
    state:         ControllerState,
}

impl PhaseStateMachine {
    /// Create a machine in its initial state, `Green(0)`.
    pub fn new(intersection: &Intersection, threshold: f64, warn_after: u32) -> Self {
        Self {
            intersection: intersection.id,
            phase_count:  intersection.phase_count(),
            threshold,
            warn_after:   warn_after.max(1),
            state:        ControllerState::initial(),
        }
    }

    pub fn from_config(intersection: &Intersection, cfg: &ControllerConfig) -> Self {
        Self::new(intersection, cfg.pressure_threshold, cfg.degraded_ticks_before_warning)
    }

    #[inline]
    pub fn intersection(&self) -> IntersectionId {
        self.intersection
    }

    #[inline]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Advance by `dt` of simulated time ending at `now` and decide.
    ///
    /// `scores` must come from the same intersection.  Fails only if the
    /// machine's own phase index is out of range, which is a logic error.
    pub fn tick(
        &mut self,
        intersection: &Intersection,
        now:          SimTime,
        dt:           SimDuration,
        scores:       &PhaseScores,
    ) -> ControlResult<TickOutcome> {
        let mut outcome = TickOutcome {
            degraded: scores.is_degraded(),
            warning:  self.track_degradation(now, scores),
            ..TickOutcome::default()
        };

        match self.state.signal {
            // ── Rule 1: clearance runs on the controller's own timer ─────────
            SignalState::Clearing { from, to, remaining } => {
                let remaining = remaining.saturating_sub(dt);
                if remaining.is_zero() {
                    self.check_phase(to)?;
                    self.state.signal = SignalState::Green { phase: to };
                    self.state.elapsed_in_active = SimDuration::ZERO;
                    self.state.pending_clearance_until = None;
                    outcome.command = Some(PhaseCommand {
                        intersection: self.intersection,
                        phase:        to,
                    });
                } else {
                    self.state.signal = SignalState::Clearing { from, to, remaining };
                }
            }

            SignalState::Green { phase } => {
                let def = intersection.phase(phase).ok_or(ControlError::PhaseOutOfRange {
                    intersection: self.intersection,
                    phase,
                    phase_count:  self.phase_count,
                })?;
                self.state.elapsed_in_active += dt;
                let elapsed = self.state.elapsed_in_active;

                // ── Rule 2: minimum green is unconditional ───────────────────
                if elapsed < def.min_green {
                    return Ok(outcome);
                }

                // ── Rule 3: forced switch at maximum green ──────────────────
                if elapsed >= def.max_green {
                    let to = match scores.best_alternative(phase) {
                        Some((p, s)) if s.0 > 0.0 => p,
                        _ => phase.next_in_cycle(self.phase_count),
                    };
                    outcome.switch =
                        Some(self.begin_clearing(phase, to, def.clearance, now, SwitchReason::MaxGreen)?);
                    return Ok(outcome);
                }

                // ── Rule 4: early switch only past the hysteresis margin ────
                if let Some((to, best)) = scores.best_alternative(phase) {
                    let gain = best.0 - scores.get(phase).0;
                    if gain >= self.threshold {
                        outcome.switch = Some(self.begin_clearing(
                            phase,
                            to,
                            def.clearance,
                            now,
                            SwitchReason::Pressure,
                        )?);
                    }
                }
            }
        }

        Ok(outcome)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn begin_clearing(
        &mut self,
        from:      PhaseIndex,
        to:        PhaseIndex,
        clearance: SimDuration,
        now:       SimTime,
        reason:    SwitchReason,
    ) -> ControlResult<SwitchEvent> {
        self.check_phase(to)?;
        let elapsed_green = self.state.elapsed_in_active;
        self.state.signal = SignalState::Clearing { from, to, remaining: clearance };
        self.state.pending_clearance_until = now.checked_add(clearance);
        self.state.switches += 1;

        debug!(
            "{} at {now}: {from} -> {to} after {elapsed_green} green ({reason:?})",
            self.intersection
        );

        Ok(SwitchEvent {
            intersection: self.intersection,
            at: now,
            from,
            to,
            elapsed_green,
            reason,
        })
    }

    fn check_phase(&self, phase: PhaseIndex) -> ControlResult<()> {
        if phase.index() < self.phase_count {
            Ok(())
        } else {
            Err(ControlError::PhaseOutOfRange {
                intersection: self.intersection,
                phase,
                phase_count:  self.phase_count,
            })
        }
    }

    /// Count consecutive degraded ticks; warn exactly once per run of them.
    fn track_degradation(&mut self, now: SimTime, scores: &PhaseScores) -> Option<TelemetryGapWarning> {
        if !scores.is_degraded() {
            self.state.degraded_streak = 0;
            return None;
        }

        self.state.degraded_streak += 1;
        let missing = scores.missing_lanes();
        debug!(
            "{} at {now}: degraded telemetry ({} lane(s) missing, streak {})",
            self.intersection,
            missing.len(),
            self.state.degraded_streak
        );

        if self.state.degraded_streak != self.warn_after {
            return None;
        }
        warn!(
            "{} at {now}: telemetry gap for {} consecutive ticks, missing {:?}",
            self.intersection, self.state.degraded_streak, missing
        );
        Some(TelemetryGapWarning {
            intersection:      self.intersection,
            at:                now,
            consecutive_ticks: self.state.degraded_streak,
            missing_lanes:     missing,
        })
    }
}
