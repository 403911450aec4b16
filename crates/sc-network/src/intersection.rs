//! Phases, lane groups, and the intersection that owns them.

use sc_core::{IntersectionId, LaneId, PhaseIndex, SimDuration};

/// A set of movements released together: the lanes queueing to enter the
/// junction and the lanes they discharge into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaneGroup {
    pub incoming: Vec<LaneId>,
    /// May be empty when downstream lanes are not tracked.
    pub outgoing: Vec<LaneId>,
}

impl LaneGroup {
    pub fn new(incoming: Vec<LaneId>, outgoing: Vec<LaneId>) -> Self {
        Self { incoming, outgoing }
    }
}

/// One signal configuration.  Immutable once the corridor is built.
#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    /// Lane groups granted right-of-way simultaneously, in definition order.
    pub groups: Vec<LaneGroup>,
    pub min_green: SimDuration,
    pub max_green: SimDuration,
    /// All-red / yellow transition required after this phase ends.
    pub clearance: SimDuration,
}

impl Phase {
    /// All incoming lanes served by this phase, in group order.
    pub fn incoming_lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.groups.iter().flat_map(|g| g.incoming.iter().copied())
    }

    /// All outgoing lanes fed by this phase, in group order.
    pub fn outgoing_lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.groups.iter().flat_map(|g| g.outgoing.iter().copied())
    }
}

/// A signalized junction.
///
/// Constructed only through [`CorridorBuilder`][crate::CorridorBuilder], which
/// guarantees at least two phases, non-empty lane groups, and
/// `min_green < max_green` for every phase.
#[derive(Clone, Debug)]
pub struct Intersection {
    pub id: IntersectionId,
    /// External identifier (e.g. the simulator's junction id).
    pub name: String,
    /// Phases in cycle order.  Cycle order is only consulted as a fallback.
    pub phases: Vec<Phase>,

    /// Sorted, de-duplicated union of every phase's incoming lanes.
    incoming: Vec<LaneId>,
    /// Sorted, de-duplicated union of every phase's outgoing lanes.
    outgoing: Vec<LaneId>,
}

impl Intersection {
    pub(crate) fn new(id: IntersectionId, name: String, phases: Vec<Phase>) -> Self {
        let mut incoming: Vec<LaneId> = phases.iter().flat_map(|p| p.incoming_lanes()).collect();
        incoming.sort_unstable();
        incoming.dedup();
        let mut outgoing: Vec<LaneId> = phases.iter().flat_map(|p| p.outgoing_lanes()).collect();
        outgoing.sort_unstable();
        outgoing.dedup();
        Self { id, name, phases, incoming, outgoing }
    }

    #[inline]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn phase(&self, index: PhaseIndex) -> Option<&Phase> {
        self.phases.get(index.index())
    }

    /// Iterator over `(PhaseIndex, &Phase)` in cycle order.
    pub fn indexed_phases(&self) -> impl Iterator<Item = (PhaseIndex, &Phase)> + '_ {
        self.phases
            .iter()
            .enumerate()
            .map(|(i, p)| (PhaseIndex(i as u16), p))
    }

    pub fn incoming_lanes(&self) -> &[LaneId] {
        &self.incoming
    }

    pub fn outgoing_lanes(&self) -> &[LaneId] {
        &self.outgoing
    }

    /// Lanes whose telemetry this intersection's controller reads.
    ///
    /// Outgoing lanes are only needed when downstream capacity is weighted.
    pub fn monitored_lanes(&self, include_outgoing: bool) -> Vec<LaneId> {
        let mut lanes = self.incoming.clone();
        if include_outgoing {
            lanes.extend_from_slice(&self.outgoing);
            lanes.sort_unstable();
            lanes.dedup();
        }
        lanes
    }
}
