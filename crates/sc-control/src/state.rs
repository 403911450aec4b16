//! Per-intersection controller state.

use serde::Serialize;

use sc_core::{PhaseIndex, SimDuration, SimTime};

/// The signal an intersection is showing, as a tagged variant so every
/// transition is a total function of (state, elapsed time, scores).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SignalState {
    /// `phase` holds right-of-way.
    Green { phase: PhaseIndex },
    /// Transitioning `from → to`; no decisions are made until `remaining`
    /// reaches zero.
    Clearing {
        from:      PhaseIndex,
        to:        PhaseIndex,
        remaining: SimDuration,
    },
}

impl SignalState {
    /// The phase whose indication is currently displayed.  During clearance
    /// this is the phase being left.
    #[inline]
    pub fn active_phase(&self) -> PhaseIndex {
        match *self {
            SignalState::Green { phase } => phase,
            SignalState::Clearing { from, .. } => from,
        }
    }

    #[inline]
    pub fn is_clearing(&self) -> bool {
        matches!(self, SignalState::Clearing { .. })
    }
}

/// Mutable state owned by exactly one [`PhaseStateMachine`][crate::PhaseStateMachine].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControllerState {
    pub signal: SignalState,
    /// Green time accumulated by the active phase.  Frozen while clearing;
    /// reset to zero when the next green begins.
    pub elapsed_in_active: SimDuration,
    /// When the current clearance ends, if one is in progress.
    pub pending_clearance_until: Option<SimTime>,
    /// Consecutive evaluation ticks with incomplete telemetry.
    pub degraded_streak: u32,
    /// Switches committed since the run started.
    pub switches: u64,
}

impl ControllerState {
    /// Initial state: first defined phase green, nothing elapsed.
    pub fn initial() -> Self {
        Self {
            signal:                  SignalState::Green { phase: PhaseIndex(0) },
            elapsed_in_active:       SimDuration::ZERO,
            pending_clearance_until: None,
            degraded_streak:         0,
            switches:                0,
        }
    }

    #[inline]
    pub fn active_phase(&self) -> PhaseIndex {
        self.signal.active_phase()
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::initial()
    }
}
