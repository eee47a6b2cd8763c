//! Two-criterion dominance and the per-vertex fronts built on it.

use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use super::label::{Label, LabelArena, LabelId};
use crate::routing::query::Direction;
use crate::{Quality, Time};

/// Pareto dominance over (elapsed time, quality): `a` makes `b` not worth
/// keeping iff `a`'s journey is no longer and its quality no worse.
///
/// Elapsed time is measured from the search anchor, so the timestamp
/// comparison depends on direction: times increase away from the anchor in
/// a depart-after search but decrease in an arrive-by search, where the
/// greater timestamp is the shorter journey. Non-strict, so equal labels
/// dominate each other and the incumbent wins ties.
pub fn better_or_equal(
    direction: Direction,
    a_time: Time,
    a_quality: Quality,
    b_time: Time,
    b_quality: Quality,
) -> bool {
    let no_longer = match direction {
        Direction::DepartAfter => a_time <= b_time,
        Direction::ArriveBy => a_time >= b_time,
    };
    no_longer && a_quality >= b_quality
}

/// Per-vertex fronts of non-dominated labels.
///
/// A binary heap cannot re-prioritize entries, so displaced labels stay in
/// the queue and are filtered on pop via their `retired` flag (lazy
/// deletion); this structure is what flips that flag.
#[derive(Debug)]
pub struct PathTree {
    direction: Direction,
    fronts: HashMap<NodeIndex, Vec<LabelId>>,
}

impl PathTree {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            fronts: HashMap::new(),
        }
    }

    /// Offer a freshly built label. Returns its handle if it survived the
    /// dominance check (and is now part of the tree), `None` if an existing
    /// label at the same vertex dominates it. Existing labels dominated by
    /// the newcomer are retired.
    pub fn offer(&mut self, label: Label, arena: &mut LabelArena) -> Option<LabelId> {
        let direction = self.direction;
        let front = self.fronts.entry(label.vertex).or_default();
        for &id in front.iter() {
            let incumbent = arena.get(id);
            if better_or_equal(
                direction,
                incumbent.time,
                incumbent.quality,
                label.time,
                label.quality,
            ) {
                return None;
            }
        }
        front.retain(|&id| {
            let incumbent = arena.get(id);
            if better_or_equal(
                direction,
                label.time,
                label.quality,
                incumbent.time,
                incumbent.quality,
            ) {
                arena.retire(id);
                false
            } else {
                true
            }
        });
        let vertex = label.vertex;
        let id = arena.push(label);
        self.fronts.entry(vertex).or_default().push(id);
        Some(id)
    }

    /// Lazy-deletion test on pop: has this label been displaced since it was
    /// enqueued?
    pub fn is_live(&self, id: LabelId, arena: &LabelArena) -> bool {
        !arena.get(id).retired
    }

    /// Surviving labels at a vertex.
    pub fn labels_at(&self, vertex: NodeIndex) -> &[LabelId] {
        self.fronts.get(&vertex).map_or(&[], Vec::as_slice)
    }
}
