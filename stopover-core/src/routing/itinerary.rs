//! Path to itinerary assembly.
//!
//! A raw path carries one state per expansion, including every intermediate
//! street vertex. Consumers want legs: maximal runs of a single mode with
//! named endpoints and times.

use itertools::Itertools;
use serde::Serialize;

use crate::model::{TransportGraph, TraverseMode};
use crate::search::Path;
use crate::{Quality, Time};

#[derive(Debug, Clone, Serialize)]
pub struct ItineraryLeg {
    pub mode: TraverseMode,
    pub from: String,
    pub to: String,
    pub departs: Time,
    pub arrives: Time,
}

/// One complete journey option for a leg of the request.
#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub legs: Vec<ItineraryLeg>,
    pub departs: Time,
    pub arrives: Time,
    /// Total POI score collected along the journey.
    pub quality: Quality,
}

impl Itinerary {
    /// Collapse a chronological path into mode-homogeneous legs. The root
    /// state has no arriving mode and only contributes its endpoint.
    pub fn from_path(path: &Path, graph: &TransportGraph) -> Self {
        let mut legs = Vec::new();
        let chunks = path
            .states
            .iter()
            .enumerate()
            .skip(1)
            .chunk_by(|(_, s)| s.mode);
        for (mode, group) in &chunks {
            let Some(mode) = mode else { continue };
            let (first, last) = group.fold((usize::MAX, 0), |(f, _), (i, _)| (f.min(i), i));
            legs.push(ItineraryLeg {
                mode,
                from: graph.vertex_name(path.states[first - 1].vertex).to_owned(),
                to: graph.vertex_name(path.states[last].vertex).to_owned(),
                departs: path.states[first - 1].time,
                arrives: path.states[last].time,
            });
        }
        Itinerary {
            legs,
            departs: path.start_time(),
            arrives: path.end_time(),
            quality: path.quality(),
        }
    }

    pub fn from_paths(paths: &[Path], graph: &TransportGraph) -> Vec<Self> {
        paths.iter().map(|p| Self::from_path(p, graph)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::query::Direction;
    use crate::search::{Label, LabelArena};
    use geo::Point;
    use petgraph::graph::NodeIndex;

    fn push(
        arena: &mut LabelArena,
        parent: crate::search::LabelId,
        vertex: NodeIndex,
        time: Time,
        mode: TraverseMode,
    ) -> crate::search::LabelId {
        arena.push(Label {
            vertex,
            time,
            parent: Some(parent),
            mode: Some(mode),
            ..Label::root(vertex, 0)
        })
    }

    #[test]
    fn consecutive_same_mode_states_merge_into_one_leg() {
        let mut graph = TransportGraph::new();
        let names = ["start", "corner", "stop_a", "stop_b", "goal"];
        let nodes: Vec<NodeIndex> = names
            .iter()
            .enumerate()
            .map(|(i, n)| graph.add_vertex(*n, Point::new(30.0 + 0.001 * i as f64, 59.0)))
            .collect();

        let mut arena = LabelArena::new();
        // walk, walk, transit, walk
        let mut tip = arena.push(Label::root(nodes[0], 100));
        tip = push(&mut arena, tip, nodes[1], 160, TraverseMode::Walk);
        tip = push(&mut arena, tip, nodes[2], 220, TraverseMode::Walk);
        tip = push(&mut arena, tip, nodes[3], 500, TraverseMode::Transit);
        tip = push(&mut arena, tip, nodes[4], 560, TraverseMode::Walk);

        let path = Path::from_label(tip, &arena, &graph, Direction::DepartAfter);
        let itinerary = Itinerary::from_path(&path, &graph);

        assert_eq!(itinerary.legs.len(), 3);
        let walk = &itinerary.legs[0];
        assert_eq!(walk.mode, TraverseMode::Walk);
        assert_eq!((walk.from.as_str(), walk.to.as_str()), ("start", "stop_a"));
        assert_eq!((walk.departs, walk.arrives), (100, 220));
        assert_eq!(itinerary.legs[1].mode, TraverseMode::Transit);
        assert_eq!(itinerary.legs[2].mode, TraverseMode::Walk);
        assert_eq!(itinerary.departs, 100);
        assert_eq!(itinerary.arrives, 560);
    }

    #[test]
    fn root_only_path_has_no_legs() {
        let mut graph = TransportGraph::new();
        let v = graph.add_vertex("v", Point::new(30.0, 59.0));
        let mut arena = LabelArena::new();
        let tip = arena.push(Label::root(v, 100));
        let path = Path::from_label(tip, &arena, &graph, Direction::DepartAfter);
        let itinerary = Itinerary::from_path(&path, &graph);
        assert!(itinerary.legs.is_empty());
        assert_eq!(itinerary.departs, 100);
    }
}
