//! Deterministic per-lane RNG.
//!
//! # Determinism strategy
//!
//! Each lane gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (lane_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive lane IDs uniformly across the seed space.
//! Adding lanes at the end of the registry does not disturb the streams of
//! existing lanes, so demand stays reproducible as a corridor grows.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::LaneId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-lane deterministic RNG.
pub struct LaneRng(SmallRng);

impl LaneRng {
    /// Seed deterministically from the run's global seed and a lane ID.
    pub fn new(global_seed: u64, lane: LaneId) -> Self {
        let seed = global_seed ^ (lane.0 as u64).wrapping_mul(MIXING_CONSTANT);
        LaneRng(SmallRng::seed_from_u64(seed))
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}
