//! Time-dependent transportation graph.
//!
//! The search engine only needs a narrow surface from the graph: adjacency,
//! edge traversal producing zero or more successor results, coordinate
//! resolution, and a per-edge lower bound for the goal-direction heuristic.
//! This module carries a compact in-memory implementation of that surface.

use geo::{Distance, Haversine, Point};
use petgraph::Direction as EdgeDirection;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::Serialize;

use crate::routing::query::Direction;
use crate::{Error, MAX_BOARDINGS_PER_TRAVERSAL, MAX_SNAP_DISTANCE, BOARD_COST, Time};

/// Mode a label arrived by. Stored on labels and itinerary legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraverseMode {
    Walk,
    Transit,
    Transfer,
}

/// A scheduled run over a timetable link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub departs: Time,
    pub arrives: Time,
}

/// Edge payload.
#[derive(Debug, Clone)]
pub enum LinkKind {
    /// Fixed-duration street segment.
    Street { duration: Time },
    /// Timetabled service; departures sorted by departure time.
    Transit { departures: Vec<Departure> },
    /// Station-to-station interchange of fixed duration.
    Transfer { duration: Time },
}

#[derive(Debug, Clone)]
pub struct TransitLink {
    pub kind: LinkKind,
    /// Whether the link satisfies accessibility constraints. Inaccessible
    /// links are skipped for accessible queries unless relaxation applied.
    pub accessible: bool,
}

/// Vertex payload.
#[derive(Debug, Clone)]
pub struct TransitVertex {
    pub name: String,
    pub geometry: Point<f64>,
}

/// One successor produced by traversing an edge.
#[derive(Debug, Clone, Copy)]
pub struct Traversal {
    pub to: NodeIndex,
    /// Simulated time at `to`: later than the label for depart-after
    /// searches, earlier for arrive-by.
    pub time: Time,
    pub weight_delta: f64,
    pub mode: TraverseMode,
}

/// Constraints the graph needs from the active query to traverse an edge.
#[derive(Debug, Clone, Copy)]
pub struct TraverseOptions {
    pub direction: Direction,
    pub accessible_only: bool,
}

type VertexLocation = GeomWithData<[f64; 2], NodeIndex>;

/// The routing graph: a directed multigraph with a spatial index over its
/// vertices. Read-only during search, so shared references are safe across
/// concurrent searches.
#[derive(Debug, Clone, Default)]
pub struct TransportGraph {
    pub graph: DiGraph<TransitVertex, TransitLink>,
    index: RTree<VertexLocation>,
}

impl TransportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, name: impl Into<String>, geometry: Point<f64>) -> NodeIndex {
        let node = self.graph.add_node(TransitVertex {
            name: name.into(),
            geometry,
        });
        self.index
            .insert(VertexLocation::new([geometry.x(), geometry.y()], node));
        node
    }

    pub fn add_street(&mut self, from: NodeIndex, to: NodeIndex, duration: Time) -> EdgeIndex {
        self.add_link(from, to, LinkKind::Street { duration }, true)
    }

    /// Street segment that does not satisfy accessibility constraints
    /// (stairs, steep inclines).
    pub fn add_inaccessible_street(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        duration: Time,
    ) -> EdgeIndex {
        self.add_link(from, to, LinkKind::Street { duration }, false)
    }

    pub fn add_transit(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        mut departures: Vec<Departure>,
    ) -> EdgeIndex {
        departures.sort_by_key(|d| d.departs);
        self.add_link(from, to, LinkKind::Transit { departures }, true)
    }

    pub fn add_transfer(&mut self, from: NodeIndex, to: NodeIndex, duration: Time) -> EdgeIndex {
        self.add_link(from, to, LinkKind::Transfer { duration }, true)
    }

    fn add_link(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        kind: LinkKind,
        accessible: bool,
    ) -> EdgeIndex {
        self.graph.add_edge(from, to, TransitLink { kind, accessible })
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn vertex_point(&self, vertex: NodeIndex) -> Point<f64> {
        self.graph[vertex].geometry
    }

    pub fn vertex_name(&self, vertex: NodeIndex) -> &str {
        &self.graph[vertex].name
    }

    /// Resolve a requested location to the nearest vertex within
    /// [`MAX_SNAP_DISTANCE`] metres.
    ///
    /// # Errors
    ///
    /// [`Error::VertexNotFound`] when the graph is empty or the nearest
    /// vertex is too far away. Fatal for the whole request.
    pub fn resolve(&self, location: Point<f64>) -> Result<NodeIndex, Error> {
        let not_found = || {
            Error::VertexNotFound(format!(
                "no vertex within {MAX_SNAP_DISTANCE:.0} m of ({:.5}, {:.5})",
                location.x(),
                location.y()
            ))
        };
        let nearest = self
            .index
            .nearest_neighbor(&[location.x(), location.y()])
            .ok_or_else(not_found)?;
        let vertex = nearest.data;
        if Haversine.distance(location, self.vertex_point(vertex)) > MAX_SNAP_DISTANCE {
            return Err(not_found());
        }
        Ok(vertex)
    }

    /// Edges to expand from `vertex`: outgoing for depart-after searches,
    /// incoming when searching backwards for an arrive-by request.
    pub fn adjacent_edges(&self, vertex: NodeIndex, direction: Direction) -> Vec<EdgeIndex> {
        let dir = match direction {
            Direction::DepartAfter => EdgeDirection::Outgoing,
            Direction::ArriveBy => EdgeDirection::Incoming,
        };
        self.graph.edges_directed(vertex, dir).map(|e| e.id()).collect()
    }

    /// Traverse `edge` from a label at time `at`, producing zero or more
    /// successor results. A timetable edge may yield one result per
    /// catchable departure (boarding alternative services); street and
    /// transfer edges yield at most one.
    pub fn traverse(&self, edge: EdgeIndex, at: Time, options: TraverseOptions) -> Vec<Traversal> {
        let Some((tail, head)) = self.graph.edge_endpoints(edge) else {
            return Vec::new();
        };
        let link = &self.graph[edge];
        if options.accessible_only && !link.accessible {
            return Vec::new();
        }
        // The vertex the search moves to: the head of the edge going
        // forward, the tail going backward.
        let to = match options.direction {
            Direction::DepartAfter => head,
            Direction::ArriveBy => tail,
        };

        match &link.kind {
            LinkKind::Street { duration } => {
                vec![Traversal {
                    to,
                    time: shift(at, *duration, options.direction),
                    weight_delta: *duration as f64,
                    mode: TraverseMode::Walk,
                }]
            }
            LinkKind::Transfer { duration } => {
                vec![Traversal {
                    to,
                    time: shift(at, *duration, options.direction),
                    weight_delta: *duration as f64,
                    mode: TraverseMode::Transfer,
                }]
            }
            LinkKind::Transit { departures } => match options.direction {
                Direction::DepartAfter => departures
                    .iter()
                    .filter(|d| d.departs >= at)
                    .take(MAX_BOARDINGS_PER_TRAVERSAL)
                    .map(|d| Traversal {
                        to,
                        time: d.arrives,
                        weight_delta: (d.arrives - at) as f64 + BOARD_COST,
                        mode: TraverseMode::Transit,
                    })
                    .collect(),
                Direction::ArriveBy => departures
                    .iter()
                    .rev()
                    .filter(|d| d.arrives <= at)
                    .take(MAX_BOARDINGS_PER_TRAVERSAL)
                    .map(|d| Traversal {
                        to,
                        time: d.departs,
                        weight_delta: (at - d.departs) as f64 + BOARD_COST,
                        mode: TraverseMode::Transit,
                    })
                    .collect(),
            },
        }
    }

    /// Fastest point-to-point speed any single link achieves, in m/s.
    /// Timetabled services can outrun any street, so straight-line bounds
    /// for transit requests must divide by this, not the street maximum.
    pub fn max_link_speed_mps(&self) -> f64 {
        self.graph.edge_indices().fold(0.0, |fastest, edge| {
            let Some((tail, head)) = self.graph.edge_endpoints(edge) else {
                return fastest;
            };
            let seconds = self.min_link_seconds(edge);
            if !seconds.is_finite() || seconds <= 0.0 {
                return fastest;
            }
            let meters = Haversine.distance(self.vertex_point(tail), self.vertex_point(head));
            fastest.max(meters / seconds)
        })
    }

    /// Admissible lower bound, in seconds, on traversing `edge`. Ride time
    /// only for timetable edges: waiting and boarding penalties are never
    /// counted, so the bound cannot overestimate.
    pub fn min_link_seconds(&self, edge: EdgeIndex) -> f64 {
        match &self.graph[edge].kind {
            LinkKind::Street { duration } | LinkKind::Transfer { duration } => *duration as f64,
            LinkKind::Transit { departures } => departures
                .iter()
                .map(|d| (d.arrives - d.departs) as f64)
                .fold(f64::INFINITY, f64::min),
        }
    }
}

fn shift(at: Time, duration: Time, direction: Direction) -> Time {
    match direction {
        Direction::DepartAfter => at + duration,
        Direction::ArriveBy => at - duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward() -> TraverseOptions {
        TraverseOptions {
            direction: Direction::DepartAfter,
            accessible_only: false,
        }
    }

    fn backward() -> TraverseOptions {
        TraverseOptions {
            direction: Direction::ArriveBy,
            accessible_only: false,
        }
    }

    #[test]
    fn street_traversal_shifts_time_with_direction() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.001, 59.0));
        let edge = graph.add_street(a, b, 60);

        let fwd = graph.traverse(edge, 1_000, forward());
        assert_eq!(fwd.len(), 1);
        assert_eq!(fwd[0].to, b);
        assert_eq!(fwd[0].time, 1_060);

        let bwd = graph.traverse(edge, 1_000, backward());
        assert_eq!(bwd[0].to, a);
        assert_eq!(bwd[0].time, 940);
    }

    #[test]
    fn transit_traversal_yields_catchable_departures() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.01, 59.0));
        let edge = graph.add_transit(
            a,
            b,
            vec![
                Departure { departs: 300, arrives: 500 },
                Departure { departs: 100, arrives: 250 },
                Departure { departs: 600, arrives: 800 },
            ],
        );

        // Departure at 100 already left.
        let fwd = graph.traverse(edge, 150, forward());
        let times: Vec<Time> = fwd.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![500, 800]);
        // Wait (150) + ride (200) + boarding penalty.
        assert_eq!(fwd[0].weight_delta, 350.0 + BOARD_COST);

        // Backward from 600: only the runs arriving in time count.
        let bwd = graph.traverse(edge, 600, backward());
        let times: Vec<Time> = bwd.iter().map(|t| t.time).collect();
        assert_eq!(times, vec![300, 100]);
    }

    #[test]
    fn accessibility_filter_suppresses_links() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.001, 59.0));
        let edge = graph.add_inaccessible_street(a, b, 30);

        let strict = TraverseOptions {
            direction: Direction::DepartAfter,
            accessible_only: true,
        };
        assert!(graph.traverse(edge, 0, strict).is_empty());
        assert_eq!(graph.traverse(edge, 0, forward()).len(), 1);
    }

    #[test]
    fn resolve_snaps_to_nearest_vertex() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        graph.add_vertex("b", Point::new(30.1, 59.0));

        let got = graph.resolve(Point::new(30.0001, 59.0)).unwrap();
        assert_eq!(got, a);

        // Several kilometres from anything.
        let err = graph.resolve(Point::new(31.0, 60.0)).unwrap_err();
        assert!(matches!(err, Error::VertexNotFound(_)));
    }

    #[test]
    fn max_link_speed_tracks_the_fastest_link() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.01, 59.0));
        // Roughly 57 km covered in 600 s, about 95 m/s.
        let c = graph.add_vertex("c", Point::new(31.01, 59.0));
        graph.add_street(a, b, 600);
        graph.add_transit(b, c, vec![Departure { departs: 0, arrives: 600 }]);

        let fastest = graph.max_link_speed_mps();
        assert!(fastest > 90.0 && fastest < 100.0, "got {fastest}");
    }

    #[test]
    fn min_link_seconds_is_ride_time_only() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.01, 59.0));
        let edge = graph.add_transit(
            a,
            b,
            vec![
                Departure { departs: 0, arrives: 400 },
                Departure { departs: 1_000, arrives: 1_150 },
            ],
        );
        assert_eq!(graph.min_link_seconds(edge), 150.0);
    }
}
