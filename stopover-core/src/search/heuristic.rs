//! Remaining-cost estimators for the label-setting search.
//!
//! Three interchangeable estimators, selected per request: a trivial zero
//! bound, a straight-line bound for street-only requests, and an
//! interleaved backward Dijkstra for transit requests that refines its
//! bounds incrementally between forward expansion steps. All three are
//! admissible; a non-finite estimate tells the engine to prune the branch.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use fixedbitset::FixedBitSet;
use geo::{Distance, Haversine};
use petgraph::graph::NodeIndex;

use super::label::Label;
use crate::MAX_STREET_SPEED_MPS;
use crate::model::TransportGraph;
use crate::routing::query::LegQuery;

/// Nodes settled while the heuristic initializes.
const INITIAL_SETTLE_BATCH: usize = 1_000;

/// Nodes settled per `do_some_work` call, interleaved with forward
/// expansion.
const SETTLE_BATCH: usize = 20;

#[derive(Copy, Clone, PartialEq)]
struct BackwardEntry {
    cost: f64,
    node: NodeIndex,
}

impl Eq for BackwardEntry {}

// Min-heap by cost (reversed from the standard max-heap ordering).
impl Ord for BackwardEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for BackwardEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Admissible estimate of the remaining weight from a label to the search
/// target.
pub enum RemainingCost {
    /// No goal direction; always admissible, explores the most.
    Trivial,
    /// Great-circle distance over the maximum street speed. Used when the
    /// request involves no transit modes.
    Euclidean,
    /// Backward Dijkstra over per-edge lower bounds from the target,
    /// advanced one batch per forward expansion step. Exact for settled
    /// vertices, straight-line fallback for the rest, infinite once the
    /// backward search has exhausted the component without reaching a
    /// vertex.
    Interleaved {
        dists: Vec<f64>,
        settled: FixedBitSet,
        heap: BinaryHeap<BackwardEntry>,
        exhausted: bool,
        /// Speed dividing the straight-line fallback for unsettled
        /// vertices. Timetabled links can outrun any street, so this is
        /// the fleet-wide fastest link; dividing by the street maximum
        /// would overestimate and break admissibility.
        fallback_speed: f64,
    },
}

impl RemainingCost {
    /// Selection policy: trivial when heuristics are disabled, interleaved
    /// for transit requests, straight-line otherwise.
    pub fn for_query(leg: &LegQuery, graph: &TransportGraph) -> Self {
        if leg.disable_heuristic {
            RemainingCost::Trivial
        } else if leg.use_transit {
            let n = graph.vertex_count();
            RemainingCost::Interleaved {
                dists: vec![f64::INFINITY; n],
                settled: FixedBitSet::with_capacity(n),
                heap: BinaryHeap::new(),
                exhausted: false,
                fallback_speed: graph.max_link_speed_mps().max(MAX_STREET_SPEED_MPS),
            }
        } else {
            RemainingCost::Euclidean
        }
    }

    /// Prepare for a search towards `leg`'s target. May be cut short by the
    /// abort deadline; the engine re-checks the clock afterwards.
    pub fn initialize(&mut self, graph: &TransportGraph, leg: &LegQuery, abort_time: Option<Instant>) {
        if let RemainingCost::Interleaved { dists, heap, .. } = self {
            dists[leg.search_target.index()] = 0.0;
            heap.push(BackwardEntry {
                cost: 0.0,
                node: leg.search_target,
            });
        } else {
            return;
        }
        for _ in 0..INITIAL_SETTLE_BATCH {
            if abort_time.is_some_and(|t| Instant::now() > t) {
                return;
            }
            if !self.settle_one(graph, leg) {
                return;
            }
        }
    }

    /// One unit of incremental background work, invoked once per forward
    /// expansion step.
    pub fn do_some_work(&mut self, graph: &TransportGraph, leg: &LegQuery) {
        if matches!(self, RemainingCost::Interleaved { exhausted: false, .. }) {
            for _ in 0..SETTLE_BATCH {
                if !self.settle_one(graph, leg) {
                    break;
                }
            }
        }
    }

    /// Estimated remaining weight from `label` to the target. Negative or
    /// non-finite values signal "unreachable via this branch".
    pub fn estimate(&self, label: &Label, graph: &TransportGraph, leg: &LegQuery) -> f64 {
        match self {
            RemainingCost::Trivial => 0.0,
            RemainingCost::Euclidean => straight_line_bound(graph, label.vertex, leg),
            RemainingCost::Interleaved {
                dists,
                settled,
                exhausted,
                fallback_speed,
                ..
            } => {
                let v = label.vertex.index();
                if settled.contains(v) {
                    dists[v]
                } else if *exhausted {
                    // The backward sweep covered everything that can reach
                    // the target; this vertex cannot.
                    f64::INFINITY
                } else {
                    straight_line_meters(graph, label.vertex, leg) / fallback_speed
                }
            }
        }
    }

    /// Settle the next backward node. Returns false once the queue is
    /// drained, which marks unreached vertices as unreachable.
    fn settle_one(&mut self, graph: &TransportGraph, leg: &LegQuery) -> bool {
        let RemainingCost::Interleaved {
            dists,
            settled,
            heap,
            exhausted,
            ..
        } = self
        else {
            return false;
        };
        loop {
            let Some(BackwardEntry { cost, node }) = heap.pop() else {
                *exhausted = true;
                return false;
            };
            if settled.contains(node.index()) {
                continue;
            }
            settled.insert(node.index());
            // Relax against the search direction: what reaches `node` can
            // extend a forward label towards the target.
            for edge in graph.adjacent_edges(node, leg.direction.opposite()) {
                let Some((tail, head)) = graph.graph.edge_endpoints(edge) else {
                    continue;
                };
                let neighbor = if tail == node { head } else { tail };
                let bound = graph.min_link_seconds(edge);
                if !bound.is_finite() {
                    continue;
                }
                let next = cost + bound;
                if next < dists[neighbor.index()] {
                    dists[neighbor.index()] = next;
                    heap.push(BackwardEntry {
                        cost: next,
                        node: neighbor,
                    });
                }
            }
            return true;
        }
    }
}

fn straight_line_bound(graph: &TransportGraph, vertex: NodeIndex, leg: &LegQuery) -> f64 {
    straight_line_meters(graph, vertex, leg) / MAX_STREET_SPEED_MPS
}

fn straight_line_meters(graph: &TransportGraph, vertex: NodeIndex, leg: &LegQuery) -> f64 {
    let here = graph.vertex_point(vertex);
    let there = graph.vertex_point(leg.search_target);
    Haversine.distance(here, there)
}
