//! Edge annotation index: which POIs a graph edge passes near.

use hashbrown::HashMap;
use petgraph::graph::EdgeIndex;

use crate::PoiId;

/// Read-only mapping from graph edge to the POIs credited by traversing it.
///
/// Absent entries mean "no points on this edge" and are never an error.
#[derive(Debug, Clone, Default)]
pub struct EdgeAnnotations {
    points: HashMap<EdgeIndex, Vec<PoiId>>,
}

impl EdgeAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Annotate `edge` with the given POI ids, replacing any previous entry.
    pub fn annotate(&mut self, edge: EdgeIndex, points: Vec<PoiId>) {
        if points.is_empty() {
            self.points.remove(&edge);
        } else {
            self.points.insert(edge, points);
        }
    }

    /// POIs reachable by traversing `edge`; empty for unannotated edges.
    pub fn points_on(&self, edge: EdgeIndex) -> &[PoiId] {
        self.points.get(&edge).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
