//! `sc-network`: the static corridor model the controller runs against.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`intersection`] | `LaneGroup`, `Phase`, `Intersection`                       |
//! | [`corridor`]     | `Corridor`, `CorridorBuilder`, `PhaseSpec`                 |
//! | [`loader`]       | `NetworkFile`, `load_corridor_json`, `load_corridor_reader`|
//! | [`error`]        | `NetworkError`, `NetworkResult<T>`                         |
//!
//! The corridor is built once, before the control loop starts, and is never
//! mutated afterwards.  Every structural problem (empty lane lists, unknown
//! lane references, inverted timing bounds, a lane claimed by two
//! intersections) is reported by [`CorridorBuilder::build`] so that it
//! surfaces at startup rather than mid-run.
//!
//! Phase compatibility (no two movements served together may conflict) is a
//! property of the signal plan handed to us; it is assumed, not recomputed
//! from geometry.

pub mod corridor;
pub mod error;
pub mod intersection;
pub mod loader;


pub use corridor::{Corridor, CorridorBuilder, PhaseSpec};
pub use error::{NetworkError, NetworkResult};
pub use intersection::{Intersection, LaneGroup, Phase};
pub use loader::{NetworkFile, PhaseTimingDefaults, load_corridor_json, load_corridor_reader};
