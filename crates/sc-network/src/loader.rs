//! JSON corridor loader.
//!
//! # Format
//!
//! ```json
//! {
//!   "lanes": ["n_in", "s_in", "e_in", "w_in", "e_out"],
//!   "intersections": [
//!     {
//!       "id": "J1",
//!       "phases": [
//!         { "groups": [{ "incoming": ["n_in", "s_in"] }],
//!           "min_green_secs": 10, "max_green_secs": 60, "clearance_secs": 4 },
//!         { "groups": [{ "incoming": ["e_in", "w_in"], "outgoing": ["e_out"] }] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Phase timings are optional; omitted values come from
//! [`PhaseTimingDefaults`] (normally the controller config's defaults).
//! Lanes are referenced by name and must appear in `lanes`.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use sc_core::{ControllerConfig, LaneId};

use crate::{Corridor, CorridorBuilder, LaneGroup, NetworkError, NetworkResult, PhaseSpec};

// ── File records ──────────────────────────────────────────────────────────────

/// The `network` section of a scenario file.
#[derive(Clone, Debug, Deserialize)]
pub struct NetworkFile {
    pub lanes:         Vec<String>,
    pub intersections: Vec<IntersectionRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IntersectionRecord {
    pub id:     String,
    pub phases: Vec<PhaseRecord>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PhaseRecord {
    pub groups:         Vec<GroupRecord>,
    pub min_green_secs: Option<f64>,
    pub max_green_secs: Option<f64>,
    pub clearance_secs: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GroupRecord {
    pub incoming: Vec<String>,
    #[serde(default)]
    pub outgoing: Vec<String>,
}

/// Timings applied to phases that do not specify their own.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhaseTimingDefaults {
    pub min_green_secs: f64,
    pub max_green_secs: f64,
    pub clearance_secs: f64,
}

impl From<&ControllerConfig> for PhaseTimingDefaults {
    fn from(cfg: &ControllerConfig) -> Self {
        Self {
            min_green_secs: cfg.default_min_green_secs,
            max_green_secs: cfg.default_max_green_secs,
            clearance_secs: cfg.default_clearance_secs,
        }
    }
}

impl Default for PhaseTimingDefaults {
    fn default() -> Self {
        (&ControllerConfig::default()).into()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and validate a corridor from a JSON file.
pub fn load_corridor_json(path: &Path, defaults: PhaseTimingDefaults) -> NetworkResult<Corridor> {
    let file = std::fs::File::open(path)?;
    load_corridor_reader(file, defaults)
}

/// Like [`load_corridor_json`] but accepts any `Read` source.
pub fn load_corridor_reader<R: Read>(
    reader:   R,
    defaults: PhaseTimingDefaults,
) -> NetworkResult<Corridor> {
    let file: NetworkFile =
        serde_json::from_reader(reader).map_err(|e| NetworkError::Parse(e.to_string()))?;
    file.into_corridor(defaults)
}

impl NetworkFile {
    /// Resolve lane names, fill in default timings, and validate.
    pub fn into_corridor(self, defaults: PhaseTimingDefaults) -> NetworkResult<Corridor> {
        let mut builder = CorridorBuilder::new();
        for lane in &self.lanes {
            builder.add_lane(lane.clone());
        }

        // Resolve against the declared list directly; duplicates are caught
        // by `build`, so first declaration wins here.
        let resolve = |junction: &str, field: String, name: &str| -> NetworkResult<LaneId> {
            self.lanes
                .iter()
                .position(|l| l == name)
                .map(|i| LaneId(i as u32))
                .ok_or_else(|| {
                    NetworkError::invalid(junction, field, format!("unknown lane {name:?}"))
                })
        };

        for record in &self.intersections {
            let mut phases = Vec::with_capacity(record.phases.len());
            for (p, phase) in record.phases.iter().enumerate() {
                let mut groups = Vec::with_capacity(phase.groups.len());
                for (g, group) in phase.groups.iter().enumerate() {
                    let incoming = group
                        .incoming
                        .iter()
                        .map(|n| resolve(&record.id, format!("phases[{p}].groups[{g}].incoming"), n))
                        .collect::<NetworkResult<Vec<_>>>()?;
                    let outgoing = group
                        .outgoing
                        .iter()
                        .map(|n| resolve(&record.id, format!("phases[{p}].groups[{g}].outgoing"), n))
                        .collect::<NetworkResult<Vec<_>>>()?;
                    groups.push(LaneGroup::new(incoming, outgoing));
                }
                phases.push(PhaseSpec {
                    groups,
                    min_green_secs: phase.min_green_secs.unwrap_or(defaults.min_green_secs),
                    max_green_secs: phase.max_green_secs.unwrap_or(defaults.max_green_secs),
                    clearance_secs: phase.clearance_secs.unwrap_or(defaults.clearance_secs),
                });
            }
            builder.add_intersection(record.id.clone(), phases);
        }

        builder.build()
    }
}
