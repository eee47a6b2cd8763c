//! The label-setting search engine.
//!
//! Priority-queue-driven expansion over the transportation graph. Each
//! popped label is checked against the dominance tree (lazy deletion),
//! expanded along its adjacent edges, credited with the POIs annotated on
//! each traversed edge, and its successors re-offered to the tree. The loop
//! stops on queue exhaustion, on the wall-clock deadline (partial result),
//! when enough target labels were accepted, or on the over-search cutoff.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::dominance::PathTree;
use super::heuristic::RemainingCost;
use super::label::{Label, LabelArena, LabelId, Path};
use crate::metrics::SearchMetrics;
use crate::model::{EdgeAnnotations, PoiCatalog, TransportGraph, TraverseMode};
use crate::routing::query::LegQuery;
use crate::OVERSEARCH_MULTIPLIER;

#[derive(Copy, Clone, PartialEq)]
struct QueueEntry {
    estimate: f64,
    label: LabelId,
}

impl Eq for QueueEntry {}

// Min-heap by priority estimate (reversed from the standard ordering).
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.label.cmp(&self.label))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Everything one engine run produced. The tree and arena stay available so
/// callers can extract paths or inspect the search front.
pub struct SearchOutcome {
    pub tree: PathTree,
    pub arena: LabelArena,
    /// Labels at the target that passed terminal acceptance, in the order
    /// they were settled.
    pub accepted: Vec<LabelId>,
    /// The wall-clock deadline fired; whatever was found so far is still
    /// usable as a partial result.
    pub aborted: bool,
    pub timed_out: bool,
    pub n_visited: usize,
}

impl SearchOutcome {
    /// Surviving paths to the leg's target, chronological per path. Labels
    /// failing terminal acceptance never become output paths.
    pub fn paths(&self, graph: &TransportGraph, leg: &LegQuery) -> Vec<Path> {
        self.tree
            .labels_at(leg.search_target)
            .iter()
            .filter(|&&id| leg.accepts_terminal(self.arena.get(id)))
            .map(|&id| Path::from_label(id, &self.arena, graph, leg.direction))
            .collect()
    }
}

/// One search engine over shared, read-only data. Each [`run`] builds a
/// fresh run-state, so an instance can serve sequential requests without
/// cross-contamination.
///
/// [`run`]: SearchEngine::run
pub struct SearchEngine<'a> {
    graph: &'a TransportGraph,
    catalog: &'a PoiCatalog,
    annotations: &'a EdgeAnnotations,
    metrics: &'a dyn SearchMetrics,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        graph: &'a TransportGraph,
        catalog: &'a PoiCatalog,
        annotations: &'a EdgeAnnotations,
        metrics: &'a dyn SearchMetrics,
    ) -> Self {
        Self {
            graph,
            catalog,
            annotations,
            metrics,
        }
    }

    /// Run one search. A non-positive `relative_timeout` means no deadline.
    ///
    /// Returns `None` only when the heuristic initialization overran the
    /// deadline, which is "no result" as opposed to "no path found" (an
    /// outcome with no accepted labels).
    pub fn run(&self, leg: &LegQuery, relative_timeout: f64) -> Option<SearchOutcome> {
        let abort_time =
            (relative_timeout > 0.0).then(|| Instant::now() + Duration::from_secs_f64(relative_timeout));

        let mut arena = LabelArena::new();
        let mut tree = PathTree::new(leg.direction);

        let mut heuristic = RemainingCost::for_query(leg, self.graph);
        heuristic.initialize(self.graph, leg, abort_time);
        if abort_time.is_some_and(|t| Instant::now() > t) {
            warn!("timeout during initialization of goal direction heuristic");
            self.metrics.search_timed_out();
            return None;
        }

        // The search front is small relative to the graph: a random search
        // on a uniform grid settles about sqrt(|V|) vertices before
        // reaching its target. The heap resizes itself if we guessed low.
        let initial_capacity = (2.0 * ((self.graph.vertex_count() as f64) + 1.0).sqrt()).ceil();
        let mut queue: BinaryHeap<QueueEntry> = BinaryHeap::with_capacity(initial_capacity as usize);

        if let Some(root) = tree.offer(Label::root(leg.search_origin, leg.time), &mut arena) {
            queue.push(QueueEntry {
                estimate: 0.0,
                label: root,
            });
        }

        let mut accepted = Vec::new();
        let mut found_path_weight: Option<f64> = None;
        let mut aborted = false;
        let mut timed_out = false;
        let mut n_visited = 0usize;

        while let Some(entry) = queue.pop() {
            if abort_time.is_some_and(|t| Instant::now() > t) {
                warn!(
                    "search timeout, origin={:?} target={:?}",
                    leg.search_origin, leg.search_target
                );
                // Return the partial tree instead of failing outright so
                // the caller can still extract whatever was found.
                aborted = true;
                timed_out = true;
                self.metrics.search_timed_out();
                break;
            }

            // Interleave some heuristic-improving work (single threaded).
            heuristic.do_some_work(self.graph, leg);

            let u = entry.label;
            if !tree.is_live(u, &arena) {
                // Dominated since it was enqueued; not on any optimal path.
                continue;
            }
            n_visited += 1;

            if arena.get(u).vertex == leg.search_target && leg.accepts_terminal(arena.get(u)) {
                let weight = arena.get(u).weight;
                found_path_weight =
                    Some(found_path_weight.map_or(weight, |best| best.min(weight)));
                accepted.push(u);
                if accepted.len() >= leg.max_itineraries {
                    debug!("total vertices visited {n_visited}");
                    break;
                }
            }

            self.expand(u, leg, &mut arena, &mut tree, &mut queue, &heuristic);

            if let Some(best) = found_path_weight {
                if entry.estimate > best * OVERSEARCH_MULTIPLIER {
                    debug!("over-search cutoff after {n_visited} vertices");
                    break;
                }
            }
        }

        self.metrics.vertices_visited(n_visited);
        Some(SearchOutcome {
            tree,
            arena,
            accepted,
            aborted,
            timed_out,
            n_visited,
        })
    }

    fn expand(
        &self,
        u: LabelId,
        leg: &LegQuery,
        arena: &mut LabelArena,
        tree: &mut PathTree,
        queue: &mut BinaryHeap<QueueEntry>,
        heuristic: &RemainingCost,
    ) {
        let (u_vertex, u_time, u_weight, u_quality) = {
            let label = arena.get(u);
            (label.vertex, label.time, label.weight, label.quality)
        };
        let u_visited = arena.get(u).visited.clone();
        // Coordinates of the vertex this label came from. Compared by value
        // rather than identity: duplicate vertices exist at one location.
        let back_point = arena
            .get(u)
            .parent
            .map(|p| self.graph.vertex_point(arena.get(p).vertex));

        for edge in self.graph.adjacent_edges(u_vertex, leg.direction) {
            for traversal in self.graph.traverse(edge, u_time, leg.traverse_options()) {
                // Suppress an immediate walk back to where we just came
                // from; it can never improve a street path.
                if traversal.mode == TraverseMode::Walk
                    && back_point.is_some_and(|p| {
                        let q = self.graph.vertex_point(traversal.to);
                        p.x() == q.x() && p.y() == q.y()
                    })
                {
                    continue;
                }

                let mut visited = u_visited.clone();
                let mut quality = u_quality;
                for &poi_id in self.annotations.points_on(edge) {
                    if let Some(poi) = self.catalog.get(poi_id) {
                        if leg.filter.matches(leg.category_match, poi.categories)
                            && visited.insert(poi_id)
                        {
                            quality += poi.score;
                        }
                    }
                }

                let label = Label {
                    vertex: traversal.to,
                    time: traversal.time,
                    weight: u_weight + traversal.weight_delta,
                    quality,
                    visited,
                    parent: Some(u),
                    mode: Some(traversal.mode),
                    retired: false,
                };

                let remaining = heuristic.estimate(&label, self.graph, leg);
                if remaining < 0.0 || !remaining.is_finite() {
                    continue;
                }
                let estimate = label.weight + remaining * leg.heuristic_weight;
                if estimate > leg.max_weight {
                    // Too expensive to get there, not enqueued.
                    continue;
                }
                if leg.worst_time_exceeded(label.time) {
                    continue;
                }

                // Enqueue only if the tree judges the label hopeful.
                if let Some(id) = tree.offer(label, arena) {
                    queue.push(QueueEntry {
                        estimate,
                        label: id,
                    });
                }
            }
        }
    }
}
