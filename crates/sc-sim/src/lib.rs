//! `sc-sim`: drives the controllers against an external microsimulation.
//!
//! # Tick loop
//!
//! ```text
//! connect(simulator)                       ← worker thread, scoped to run()
//! loop:
//!   ① cancelled?        → stop, flush, summarise
//!   ② advance           → SimulatorUnavailable / SimulatorDesync abort the run
//!   ③ snapshot          → query every monitored lane once (evaluation ticks)
//!   ④ decide            → PhaseStateMachine::tick per intersection
//!                         (parallel with the `parallel` feature)
//!   ⑤ apply             → in ascending IntersectionId order:
//!                           PhaseCommand → apply_phase (visible next advance)
//!                           SwitchEvent / TelemetryGapWarning → observer
//!   ⑥ buffer records    → handed to the observer every flush interval
//! close(simulator)                         ← on every exit path
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the decide phase on Rayon's thread pool.          |
//! | `fx-hash`  | FxHash for the per-tick lane snapshot map.             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use sc_sim::{ControlLoopBuilder, NoopObserver, PointQueueConfig, PointQueueSimulator};
//!
//! let sim = PointQueueSimulator::new(&corridor, &PointQueueConfig::default())?;
//! let mut control = ControlLoopBuilder::new(corridor, controller_cfg, run_cfg).build()?;
//! let summary = control.run(sim, &mut NoopObserver)?;
//! ```

pub mod adapter;
pub mod builder;
pub mod cancel;
pub mod control_loop;
pub mod error;
pub mod observer;
pub mod point_queue;
pub mod simulator;
pub mod summary;

#[cfg(test)]
mod tests;

pub use adapter::ClockAdapter;
pub use builder::ControlLoopBuilder;
pub use cancel::CancelToken;
pub use control_loop::{ControlLoop, LaneSnapshot};
pub use error::{AdapterError, AdapterResult, SimError, SimResult};
pub use observer::{NoopObserver, RunObserver, TickRecord};
pub use point_queue::{PointQueueConfig, PointQueueSimulator};
pub use simulator::{Simulator, SimulatorFault};
pub use summary::RunSummary;
