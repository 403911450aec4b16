//! `sc-core`: foundational types for the corridor signal controller.
//!
//! This crate is a dependency of every other `sc-*` crate.  It intentionally
//! has no `sc-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `IntersectionId`, `LaneId`, `PhaseIndex`                   |
//! | [`time`]        | `SimTime`, `SimDuration`, `Tick`, `SimClock`               |
//! | [`lane`]        | `LaneState` telemetry snapshot                             |
//! | [`config`]      | `ControllerConfig`, `RunConfig`                            |
//! | [`rng`]         | `LaneRng` (per-lane deterministic RNG)                     |
//! | [`error`]       | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required to load controller configuration from JSON.       |

pub mod config;
pub mod error;
pub mod ids;
pub mod lane;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ControllerConfig, RunConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{IntersectionId, LaneId, PhaseIndex};
pub use lane::LaneState;
pub use rng::LaneRng;
pub use time::{SimClock, SimDuration, SimTime, Tick};
