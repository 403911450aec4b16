//! The corridor (set of signalized intersections) and its validating builder.

use std::collections::HashMap;

use sc_core::{IntersectionId, LaneId, SimDuration};

use crate::intersection::{Intersection, LaneGroup, Phase};
use crate::{NetworkError, NetworkResult};

// ── PhaseSpec ─────────────────────────────────────────────────────────────────

/// Unvalidated phase definition as handed to [`CorridorBuilder`].
///
/// Timings are in seconds; conversion and range checks happen in
/// [`CorridorBuilder::build`].
#[derive(Clone, Debug)]
pub struct PhaseSpec {
    pub groups:         Vec<LaneGroup>,
    pub min_green_secs: f64,
    pub max_green_secs: f64,
    pub clearance_secs: f64,
}

// ── Corridor ──────────────────────────────────────────────────────────────────

/// All signalized intersections plus the lane registry they reference.
///
/// Do not construct directly; use [`CorridorBuilder`].
#[derive(Clone, Debug)]
pub struct Corridor {
    /// External lane name, indexed by `LaneId`.
    lane_names: Vec<String>,
    lane_lookup: HashMap<String, LaneId>,
    /// Intersection whose incoming lane this is, indexed by `LaneId`.
    /// `IntersectionId::INVALID` for lanes that only ever appear as outgoing.
    lane_owner: Vec<IntersectionId>,
    /// Indexed by `IntersectionId`.
    intersections: Vec<Intersection>,
}

impl Corridor {
    pub fn lane_count(&self) -> usize {
        self.lane_names.len()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Intersection> {
        self.intersections.get(id.index())
    }

    pub fn intersection_by_name(&self, name: &str) -> Option<&Intersection> {
        self.intersections.iter().find(|i| i.name == name)
    }

    pub fn lane_name(&self, lane: LaneId) -> Option<&str> {
        self.lane_names.get(lane.index()).map(String::as_str)
    }

    pub fn lane_id(&self, name: &str) -> Option<LaneId> {
        self.lane_lookup.get(name).copied()
    }

    /// Iterator over every registered lane id.
    pub fn lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        (0..self.lane_names.len()).map(|i| LaneId(i as u32))
    }

    /// The intersection that lists `lane` as incoming, if any.
    pub fn owner_of(&self, lane: LaneId) -> Option<IntersectionId> {
        self.lane_owner
            .get(lane.index())
            .copied()
            .filter(|&id| id != IntersectionId::INVALID)
    }

    /// Every lane any controller reads, sorted and de-duplicated.
    ///
    /// The control loop queries exactly this set once per evaluation tick.
    pub fn monitored_lanes(&self, include_outgoing: bool) -> Vec<LaneId> {
        let mut lanes: Vec<LaneId> = self
            .intersections
            .iter()
            .flat_map(|i| i.monitored_lanes(include_outgoing))
            .collect();
        lanes.sort_unstable();
        lanes.dedup();
        lanes
    }
}

// ── CorridorBuilder ───────────────────────────────────────────────────────────

/// Incrementally declare lanes and intersections, then validate everything
/// at once with [`build`][Self::build].
///
/// # Example
///
/// ```rust,ignore
/// let mut b = CorridorBuilder::new();
/// let north = b.add_lane("north_in");
/// let east  = b.add_lane("east_in");
/// b.add_intersection("J1", vec![
///     PhaseSpec { groups: vec![LaneGroup::new(vec![north], vec![])], min_green_secs: 10.0, max_green_secs: 60.0, clearance_secs: 4.0 },
///     PhaseSpec { groups: vec![LaneGroup::new(vec![east],  vec![])], min_green_secs: 10.0, max_green_secs: 60.0, clearance_secs: 4.0 },
/// ]);
/// let corridor = b.build()?;
/// ```
#[derive(Default)]
pub struct CorridorBuilder {
    lanes:         Vec<String>,
    intersections: Vec<(String, Vec<PhaseSpec>)>,
}

impl CorridorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lane and return its id.  Duplicate names are reported by
    /// `build`.
    pub fn add_lane(&mut self, name: impl Into<String>) -> LaneId {
        let id = LaneId(self.lanes.len() as u32);
        self.lanes.push(name.into());
        id
    }

    /// Register an intersection and return its id.
    pub fn add_intersection(
        &mut self,
        name:   impl Into<String>,
        phases: Vec<PhaseSpec>,
    ) -> IntersectionId {
        let id = IntersectionId(self.intersections.len() as u32);
        self.intersections.push((name.into(), phases));
        id
    }

    /// Validate every declaration and produce an immutable [`Corridor`].
    pub fn build(self) -> NetworkResult<Corridor> {
        let mut lane_lookup: HashMap<String, LaneId> = HashMap::with_capacity(self.lanes.len());
        for (i, name) in self.lanes.iter().enumerate() {
            if lane_lookup.insert(name.clone(), LaneId(i as u32)).is_some() {
                return Err(NetworkError::DuplicateLane(name.clone()));
            }
        }

        let lane_count = self.lanes.len();
        let mut lane_owner = vec![IntersectionId::INVALID; lane_count];
        let mut seen_names: HashMap<&str, IntersectionId> = HashMap::new();
        let mut intersections = Vec::with_capacity(self.intersections.len());

        for (idx, (name, specs)) in self.intersections.iter().enumerate() {
            let id = IntersectionId(idx as u32);
            if seen_names.insert(name.as_str(), id).is_some() {
                return Err(NetworkError::DuplicateIntersection(name.clone()));
            }
            // Phase indices are u16.
            if specs.len() > u16::MAX as usize {
                return Err(NetworkError::invalid(
                    name,
                    "phases",
                    format!("at most {} phases are supported (got {})", u16::MAX, specs.len()),
                ));
            }
            if specs.len() < 2 {
                return Err(NetworkError::invalid(
                    name,
                    "phases",
                    format!("at least two phases are required (got {})", specs.len()),
                ));
            }

            let mut phases = Vec::with_capacity(specs.len());
            for (p, spec) in specs.iter().enumerate() {
                let phase = validate_phase(name, p, spec, lane_count)?;

                // Each incoming lane belongs to exactly one intersection.
                for (g, group) in phase.groups.iter().enumerate() {
                    for &lane in &group.incoming {
                        let owner = &mut lane_owner[lane.index()];
                        if *owner != IntersectionId::INVALID && *owner != id {
                            let other = &self.intersections[owner.index()].0;
                            return Err(NetworkError::invalid(
                                name,
                                format!("phases[{p}].groups[{g}].incoming"),
                                format!(
                                    "lane {:?} already belongs to intersection {other:?}",
                                    self.lanes[lane.index()]
                                ),
                            ));
                        }
                        *owner = id;
                    }
                }
                phases.push(phase);
            }
            intersections.push(Intersection::new(id, name.clone(), phases));
        }

        Ok(Corridor {
            lane_names: self.lanes,
            lane_lookup,
            lane_owner,
            intersections,
        })
    }
}

// ── Validation helpers ────────────────────────────────────────────────────────

fn validate_phase(
    intersection: &str,
    p:            usize,
    spec:         &PhaseSpec,
    lane_count:   usize,
) -> NetworkResult<Phase> {
    if spec.groups.is_empty() {
        return Err(NetworkError::invalid(
            intersection,
            format!("phases[{p}].groups"),
            "a phase must serve at least one lane group",
        ));
    }
    for (g, group) in spec.groups.iter().enumerate() {
        if group.incoming.is_empty() {
            return Err(NetworkError::invalid(
                intersection,
                format!("phases[{p}].groups[{g}].incoming"),
                "a lane group must have at least one incoming lane",
            ));
        }
        for (side, lanes) in [("incoming", &group.incoming), ("outgoing", &group.outgoing)] {
            if let Some(bad) = lanes.iter().find(|l| l.index() >= lane_count) {
                return Err(NetworkError::invalid(
                    intersection,
                    format!("phases[{p}].groups[{g}].{side}"),
                    format!("{bad} is not a registered lane"),
                ));
            }
        }
    }

    let secs = |field: &str, v: f64| -> NetworkResult<SimDuration> {
        SimDuration::from_secs_f64(v).ok_or_else(|| {
            NetworkError::invalid(
                intersection,
                format!("phases[{p}].{field}"),
                format!("must be a finite number >= 0 (got {v})"),
            )
        })
    };
    let min_green = secs("min_green_secs", spec.min_green_secs)?;
    let max_green = secs("max_green_secs", spec.max_green_secs)?;
    let clearance = secs("clearance_secs", spec.clearance_secs)?;

    if min_green >= max_green {
        return Err(NetworkError::invalid(
            intersection,
            format!("phases[{p}].max_green_secs"),
            format!("max green ({max_green}) must exceed min green ({min_green})"),
        ));
    }

    Ok(Phase {
        groups: spec.groups.clone(),
        min_green,
        max_green,
        clearance,
    })
}
