//! `sc-control`: the decision half of the adaptive signal controller.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                         |
//! |--------------|------------------------------------------------------------------|
//! | [`pressure`] | `LaneTelemetry` trait, `PressureEstimator`, `PressureScore`, `PhaseScores` |
//! | [`state`]    | `SignalState` (`Green` / `Clearing`), `ControllerState`          |
//! | [`machine`]  | `PhaseStateMachine`: one per intersection                       |
//! | [`event`]    | `PhaseCommand`, `SwitchEvent`, `TelemetryGapWarning`, `TickOutcome` |
//! | [`error`]    | `ControlError`, `ControlResult<T>`                               |
//!
//! # Design notes
//!
//! Each evaluation tick works in two steps:
//!
//! 1. **Score** (pure): [`PressureEstimator::score_all`] reads a lane snapshot
//!    and produces one score per phase.  A phase whose lanes are missing
//!    telemetry gets the lowest possible score for this tick only.
//!
//! 2. **Decide** (owns state): [`PhaseStateMachine::tick`] applies the timing
//!    guards and the hysteresis rule to those scores and returns a
//!    [`TickOutcome`].  The machine never talks to the simulator; the caller
//!    applies any [`PhaseCommand`] it returns.
//!
//! Machines share no mutable state, so a caller may evaluate many of them in
//! parallel as long as all are joined before commands are applied.

pub mod error;
pub mod event;
pub mod machine;
pub mod pressure;
pub mod state;


pub use error::{ControlError, ControlResult};
pub use event::{PhaseCommand, SwitchEvent, SwitchReason, TelemetryGapWarning, TickOutcome};
pub use machine::PhaseStateMachine;
pub use pressure::{LanePressure, LaneTelemetry, PhaseScores, PressureEstimator, PressureScore};
pub use state::{ControllerState, SignalState};
