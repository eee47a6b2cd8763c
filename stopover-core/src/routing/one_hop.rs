//! The two-leg route splitter.
//!
//! Splits a request with a mandatory intermediate stop into two independent
//! searches: origin to the stop under the first category filter, then stop
//! to destination under the second, departing once the stay is over. The
//! second leg anchors on the best (earliest-arriving) first-leg path, so a
//! slow scenic first leg never delays the onward journey.

use std::time::Instant;

use log::{debug, error, info};
use serde::Serialize;

use super::itinerary::Itinerary;
use super::leg::{LegPaths, resolve_leg};
use super::query::{LegQuery, RoutingQuery};
use super::waypoint::{Waypoint, collect_waypoints};
use crate::metrics::SearchMetrics;
use crate::model::{EdgeAnnotations, PoiCatalog, TransportGraph};
use crate::search::SearchEngine;
use crate::{Error, Time};

/// Result of a two-leg request. When `aborted` is set the plan is partial:
/// one or both legs hit the wall-clock budget and whatever was found so far
/// is returned.
#[derive(Debug, Default, Serialize)]
pub struct OneHopPlan {
    pub first: Vec<Itinerary>,
    pub second: Vec<Itinerary>,
    /// Distinct locations visited by the first leg's paths.
    pub first_waypoints: Vec<Waypoint>,
    pub second_waypoints: Vec<Waypoint>,
    /// When the best first-leg path reaches the intermediate stop.
    pub intermediate_arrival: Option<Time>,
    /// When the second leg departs (arrival plus stay).
    pub second_departure: Option<Time>,
    pub aborted: bool,
    pub timed_out: bool,
    pub accessibility_relaxed: bool,
}

/// Plan both legs of `query`.
///
/// # Errors
///
/// - [`Error::InvalidQuery`] for a negative stay or a zero itinerary limit.
/// - [`Error::VertexNotFound`] when any of the three locations fails to
///   resolve; checked up front so no search runs for a doomed request.
/// - [`Error::PathNotFound`] when either leg completes without a valid
///   path. The request never succeeds partially: a missing second leg
///   fails the whole request rather than returning the first leg alone.
///
/// Timeouts are not errors: they surface as the `aborted` and `timed_out`
/// flags on a (possibly empty) plan.
pub fn find_one_hop_path(
    graph: &TransportGraph,
    catalog: &PoiCatalog,
    annotations: &EdgeAnnotations,
    query: &RoutingQuery,
    metrics: &dyn SearchMetrics,
) -> Result<OneHopPlan, Error> {
    if query.stay_seconds < 0 {
        return Err(Error::InvalidQuery(format!(
            "negative stay of {} s at the intermediate stop",
            query.stay_seconds
        )));
    }
    if query.max_itineraries == 0 {
        return Err(Error::InvalidQuery("itinerary limit of zero".to_owned()));
    }
    // Fail fast on unresolvable endpoints before any search runs. The first
    // two locations are re-resolved when the leg queries are built.
    graph.resolve(query.destination)?;

    let search_begin = Instant::now();
    let engine = SearchEngine::new(graph, catalog, annotations, metrics);

    let first_leg = LegQuery::first(query, graph)?;
    let first = resolve_leg(&engine, graph, &first_leg, search_begin, 0)?;
    let Some(intermediate_arrival) = anchor_arrival(&first)? else {
        // Aborted before anything was found; without a first-leg arrival
        // the second leg has no anchor.
        debug!("first leg aborted with no paths, returning empty plan");
        metrics.search_finished(search_begin.elapsed());
        return Ok(OneHopPlan {
            aborted: true,
            timed_out: first.timed_out,
            accessibility_relaxed: first.accessibility_relaxed,
            ..OneHopPlan::default()
        });
    };
    let second_departure = intermediate_arrival + query.stay_seconds;
    info!(
        "first leg found {} path(s), onward departure at {}",
        first.paths.len(),
        second_departure
    );

    let second_leg = LegQuery::second(query, graph, second_departure)?;
    let second = resolve_leg(&engine, graph, &second_leg, search_begin, first.paths.len())?;

    metrics.search_finished(search_begin.elapsed());
    Ok(OneHopPlan {
        first_waypoints: collect_waypoints(&first.paths),
        second_waypoints: collect_waypoints(&second.paths),
        first: Itinerary::from_paths(&first.paths, graph),
        second: Itinerary::from_paths(&second.paths, graph),
        intermediate_arrival: Some(intermediate_arrival),
        second_departure: Some(second_departure),
        aborted: first.aborted || second.aborted,
        timed_out: first.timed_out || second.timed_out,
        accessibility_relaxed: first.accessibility_relaxed || second.accessibility_relaxed,
    })
}

/// Time the second leg anchors on: the earliest arrival at the
/// intermediate stop (paths arrive sorted best-first). `Ok(None)` means
/// the leg aborted before finding anything. An empty, non-aborted result
/// breaks the single-leg contract and is an internal failure.
fn anchor_arrival(first: &LegPaths) -> Result<Option<Time>, Error> {
    match first.paths.first() {
        Some(best) => Ok(Some(best.end_time())),
        None if first.aborted => Ok(None),
        None => {
            error!("first leg produced neither paths nor an abort flag");
            Err(Error::InternalSearchFailure)
        }
    }
}
