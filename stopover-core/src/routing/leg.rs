//! Single-leg orchestration around the search engine: wall-clock budgets,
//! the accessibility-relaxation retry, and path validation.

use std::time::Instant;

use log::{debug, error, warn};

use super::query::{Direction, LegQuery};
use crate::Error;
use crate::model::TransportGraph;
use crate::search::{Path, SearchEngine};

/// What one leg's search produced. `aborted`/`timed_out` mark a partial
/// result: the search hit its budget, not an error.
#[derive(Debug, Default)]
pub struct LegPaths {
    pub paths: Vec<Path>,
    pub aborted: bool,
    pub timed_out: bool,
    /// The paths were found only after relaxing accessibility constraints.
    pub accessibility_relaxed: bool,
}

/// Run one search under the request's timeout ladder.
///
/// Ladder entries are absolute offsets from `search_begin`, indexed by how
/// many itineraries the request has already produced: later searches get
/// progressively tighter deadlines. A budget that is already spent returns
/// an empty, aborted result without touching the engine.
pub fn find_leg_paths(
    engine: &SearchEngine<'_>,
    graph: &TransportGraph,
    leg: &LegQuery,
    search_begin: Instant,
    found_so_far: usize,
) -> LegPaths {
    let relative_timeout = match leg.timeouts.len() {
        0 => -1.0, // no deadline
        n => {
            let budget = leg.timeouts[found_so_far.min(n - 1)];
            let remaining = budget - search_begin.elapsed().as_secs_f64();
            if remaining <= 0.0 {
                warn!("timeout ladder exhausted before the search could start");
                return LegPaths {
                    aborted: true,
                    timed_out: true,
                    accessibility_relaxed: leg.accessibility_relaxed,
                    ..LegPaths::default()
                };
            }
            remaining
        }
    };

    let Some(outcome) = engine.run(leg, relative_timeout) else {
        // Heuristic initialization overran the deadline: no result at all.
        return LegPaths {
            aborted: true,
            timed_out: true,
            accessibility_relaxed: leg.accessibility_relaxed,
            ..LegPaths::default()
        };
    };

    let mut paths = outcome.paths(graph, leg);
    match leg.direction {
        // Earliest arrival first.
        Direction::DepartAfter => paths.sort_by_key(Path::end_time),
        // Latest departure first.
        Direction::ArriveBy => paths.sort_by_key(|p| std::cmp::Reverse(p.start_time())),
    }
    // The target front can hold more incomparable labels than requested.
    paths.truncate(leg.max_itineraries);
    LegPaths {
        paths,
        aborted: outcome.aborted,
        timed_out: outcome.timed_out,
        accessibility_relaxed: leg.accessibility_relaxed,
    }
}

/// Drop paths that violate the leg's temporal anchor. A depart-after path
/// must not start before the anchor, an arrive-by path must not end after
/// it; either indicates a search anomaly, so the path is logged and
/// discarded rather than surfaced.
pub(crate) fn drop_inverted(paths: Vec<Path>, leg: &LegQuery) -> Vec<Path> {
    paths
        .into_iter()
        .filter(|p| {
            let inverted = match leg.direction {
                Direction::DepartAfter => p.start_time() < leg.time,
                Direction::ArriveBy => p.end_time() > leg.time,
            };
            if inverted {
                error!(
                    "dropping path with inverted times: starts {} ends {} anchor {}",
                    p.start_time(),
                    p.end_time(),
                    leg.time
                );
            }
            !inverted
        })
        .collect()
}

/// Validate a search result and decide its fate. Inverted paths are always
/// dropped first, including from partial (aborted) results, which are then
/// returned with whatever survived. A completed search that ends up empty
/// is [`Error::PathNotFound`].
pub(crate) fn finish_leg(
    mut result: LegPaths,
    leg: &LegQuery,
    graph: &TransportGraph,
) -> Result<LegPaths, Error> {
    let had_candidates = !result.paths.is_empty();
    result.paths = drop_inverted(std::mem::take(&mut result.paths), leg);
    if result.aborted {
        return Ok(result);
    }
    if result.paths.is_empty() {
        let reason = if had_candidates {
            "every candidate path failed validation".to_owned()
        } else {
            format!(
                "no path from '{}' to '{}'",
                graph.vertex_name(leg.search_origin),
                graph.vertex_name(leg.search_target)
            )
        };
        return Err(Error::PathNotFound(reason));
    }
    Ok(result)
}

/// Find paths for one leg, retrying once with relaxed accessibility when a
/// strict search found nothing.
///
/// # Errors
///
/// [`Error::PathNotFound`] when the search completed but produced no valid
/// path. A timed-out search returns its (possibly empty) partial result
/// with the `aborted` flag instead.
pub fn resolve_leg(
    engine: &SearchEngine<'_>,
    graph: &TransportGraph,
    leg: &LegQuery,
    search_begin: Instant,
    found_so_far: usize,
) -> Result<LegPaths, Error> {
    let mut result = find_leg_paths(engine, graph, leg, search_begin, found_so_far);

    if result.paths.is_empty()
        && !result.aborted
        && leg.require_accessible
        && !leg.accessibility_relaxed
    {
        debug!("no accessible path, retrying with constraints relaxed");
        result = find_leg_paths(engine, graph, &leg.relaxed(), search_begin, found_so_far);
    }

    finish_leg(result, leg, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopMetrics;
    use crate::model::{EdgeAnnotations, PoiCatalog};
    use crate::search::{Label, LabelArena};
    use geo::Point;
    use std::time::Duration;

    fn street_pair(accessible: bool) -> TransportGraph {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.01, 59.0));
        if accessible {
            graph.add_street(a, b, 600);
        } else {
            graph.add_inaccessible_street(a, b, 600);
        }
        graph
    }

    fn leg(graph: &TransportGraph) -> LegQuery {
        let a = graph.resolve(Point::new(30.0, 59.0)).unwrap();
        let b = graph.resolve(Point::new(30.01, 59.0)).unwrap();
        LegQuery::for_tests(graph, a, b, Direction::DepartAfter)
    }

    #[test]
    fn spent_budget_returns_empty_aborted_without_searching() {
        let graph = street_pair(true);
        let catalog = PoiCatalog::new();
        let annotations = EdgeAnnotations::new();
        let metrics = NoopMetrics;
        let engine = SearchEngine::new(&graph, &catalog, &annotations, &metrics);

        let mut q = leg(&graph);
        q.timeouts = vec![0.001];
        let begun_long_ago = Instant::now() - Duration::from_secs(10);
        let result = find_leg_paths(&engine, &graph, &q, begun_long_ago, 0);
        assert!(result.paths.is_empty());
        assert!(result.aborted);
        assert!(result.timed_out);
    }

    #[test]
    fn accessible_search_relaxes_and_retries() {
        let graph = street_pair(false);
        let catalog = PoiCatalog::new();
        let annotations = EdgeAnnotations::new();
        let metrics = NoopMetrics;
        let engine = SearchEngine::new(&graph, &catalog, &annotations, &metrics);

        let mut q = leg(&graph);
        q.require_accessible = true;
        let result = resolve_leg(&engine, &graph, &q, Instant::now(), 0).unwrap();
        assert_eq!(result.paths.len(), 1);
        assert!(result.accessibility_relaxed);
    }

    #[test]
    fn no_route_is_path_not_found() {
        let mut graph = TransportGraph::new();
        let a = graph.add_vertex("a", Point::new(30.0, 59.0));
        let b = graph.add_vertex("b", Point::new(30.01, 59.0));
        // b only reaches a, never the other way.
        graph.add_street(b, a, 600);
        let catalog = PoiCatalog::new();
        let annotations = EdgeAnnotations::new();
        let metrics = NoopMetrics;
        let engine = SearchEngine::new(&graph, &catalog, &annotations, &metrics);

        let q = LegQuery::for_tests(&graph, a, b, Direction::DepartAfter);
        let err = resolve_leg(&engine, &graph, &q, Instant::now(), 0).unwrap_err();
        assert!(matches!(err, Error::PathNotFound(_)));
    }

    #[test]
    fn aborted_partial_results_are_still_validated() {
        let graph = street_pair(true);
        let a = graph.resolve(Point::new(30.0, 59.0)).unwrap();
        let mut q = leg(&graph);
        q.time = 1_000;

        let mut arena = LabelArena::new();
        let good = arena.push(Label::root(a, 1_200));
        let bad = arena.push(Label::root(a, 400)); // starts before the anchor
        let partial = LegPaths {
            paths: vec![
                Path::from_label(good, &arena, &graph, Direction::DepartAfter),
                Path::from_label(bad, &arena, &graph, Direction::DepartAfter),
            ],
            aborted: true,
            timed_out: true,
            accessibility_relaxed: false,
        };
        let out = finish_leg(partial, &q, &graph).unwrap();
        assert!(out.aborted);
        assert_eq!(out.paths.len(), 1);
        assert_eq!(out.paths[0].start_time(), 1_200);

        // A partial result left empty after validation stays a partial
        // result, not an error.
        let only_bad = LegPaths {
            paths: vec![Path::from_label(bad, &arena, &graph, Direction::DepartAfter)],
            aborted: true,
            timed_out: true,
            accessibility_relaxed: false,
        };
        let out = finish_leg(only_bad, &q, &graph).unwrap();
        assert!(out.paths.is_empty());
        assert!(out.aborted);
    }

    #[test]
    fn inverted_paths_are_dropped() {
        let graph = street_pair(true);
        let a = graph.resolve(Point::new(30.0, 59.0)).unwrap();
        let mut q = leg(&graph);
        q.time = 1_000;

        let mut arena = LabelArena::new();
        let good = arena.push(Label::root(a, 1_200));
        let bad = arena.push(Label::root(a, 400)); // starts before the anchor
        let paths = vec![
            Path::from_label(good, &arena, &graph, Direction::DepartAfter),
            Path::from_label(bad, &arena, &graph, Direction::DepartAfter),
        ];
        let kept = drop_inverted(paths, &q);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start_time(), 1_200);
    }
}
