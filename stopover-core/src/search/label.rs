//! Search labels and the arena that owns them.
//!
//! Labels form a tree through parent handles: every expansion allocates a
//! new label pointing at the label it was reached from, so back-chains can
//! get long but never cyclic. Handles instead of references keep lifetimes
//! trivial and path reconstruction a simple walk.

use geo::Point;
use hashbrown::HashSet;
use petgraph::graph::NodeIndex;

use crate::model::{TransportGraph, TraverseMode};
use crate::routing::query::Direction;
use crate::{PoiId, Quality, Time};

/// Handle of a label inside its [`LabelArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub(crate) usize);

/// One partial path ending at `vertex` at simulated time `time`.
#[derive(Debug, Clone)]
pub struct Label {
    pub vertex: NodeIndex,
    pub time: Time,
    /// Cumulative routing weight (seconds plus penalties).
    pub weight: f64,
    /// Cumulative POI score collected along this path.
    pub quality: Quality,
    /// POIs already credited on this path, to prevent double counting.
    pub visited: HashSet<PoiId>,
    pub parent: Option<LabelId>,
    /// Mode of the edge this label was reached by; `None` for the root.
    pub mode: Option<TraverseMode>,
    /// Set when a better label at the same vertex displaced this one. Makes
    /// the lazy-deletion check on pop O(1).
    pub(crate) retired: bool,
}

impl Label {
    /// Root label seeding a search: zero cost, nothing credited.
    pub fn root(vertex: NodeIndex, time: Time) -> Self {
        Label {
            vertex,
            time,
            weight: 0.0,
            quality: 0.0,
            visited: HashSet::new(),
            parent: None,
            mode: None,
            retired: false,
        }
    }
}

/// Flat storage for all labels of one engine run.
#[derive(Debug, Default)]
pub struct LabelArena {
    labels: Vec<Label>,
}

impl LabelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: Label) -> LabelId {
        let id = LabelId(self.labels.len());
        self.labels.push(label);
        id
    }

    pub fn get(&self, id: LabelId) -> &Label {
        &self.labels[id.0]
    }

    pub(crate) fn retire(&mut self, id: LabelId) {
        self.labels[id.0].retired = true;
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Snapshot of one label inside a reconstructed path.
#[derive(Debug, Clone)]
pub struct PathState {
    pub vertex: NodeIndex,
    pub point: Point<f64>,
    pub time: Time,
    pub weight: f64,
    pub quality: Quality,
    pub mode: Option<TraverseMode>,
}

/// An accepted path, states ordered chronologically from departure to
/// arrival regardless of search direction.
#[derive(Debug, Clone)]
pub struct Path {
    pub states: Vec<PathState>,
}

impl Path {
    /// Rebuild the path ending at `tip` by walking parent handles.
    pub fn from_label(
        tip: LabelId,
        arena: &LabelArena,
        graph: &TransportGraph,
        direction: Direction,
    ) -> Self {
        let mut states = Vec::new();
        let mut cursor = Some(tip);
        while let Some(id) = cursor {
            let label = arena.get(id);
            states.push(PathState {
                vertex: label.vertex,
                point: graph.vertex_point(label.vertex),
                time: label.time,
                weight: label.weight,
                quality: label.quality,
                mode: label.mode,
            });
            cursor = label.parent;
        }
        // Walking parents runs tip-to-root. A depart-after search roots at
        // the origin, an arrive-by search roots at the destination, so only
        // the former needs reversing to be chronological.
        if direction == Direction::DepartAfter {
            states.reverse();
        }
        Path { states }
    }

    pub fn start_time(&self) -> Time {
        self.states.first().map_or(0, |s| s.time)
    }

    pub fn end_time(&self) -> Time {
        self.states.last().map_or(0, |s| s.time)
    }

    /// Total POI score of the path.
    pub fn quality(&self) -> Quality {
        // The chronological tip carries the accumulated total; for an
        // arrive-by search that is the first state.
        self.states
            .iter()
            .map(|s| s.quality)
            .fold(0.0, Quality::max)
    }

    pub fn weight(&self) -> f64 {
        self.states.iter().map(|s| s.weight).fold(0.0, f64::max)
    }
}
