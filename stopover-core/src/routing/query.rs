//! Request types: the public two-leg query and the immutable per-leg
//! parameter set handed to the search engine.

use chrono::NaiveDateTime;
use geo::Point;
use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::Error;
use crate::Time;
use crate::model::{CategoryMatch, CategorySet, TransportGraph, TraverseOptions};
use crate::search::Label;
use crate::model::TraverseMode;

/// How far past the anchor time a leg may run before its branches are
/// pruned, in seconds.
const DEFAULT_SEARCH_WINDOW: Time = 86_400;

/// Per-attempt wall-clock budgets, in seconds. Retries after a found path
/// get progressively less patience.
const DEFAULT_TIMEOUTS: [f64; 3] = [5.0, 2.0, 1.0];

/// Temporal orientation of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Depart no earlier than the anchor time; the search roots at the
    /// origin and times increase.
    DepartAfter,
    /// Arrive no later than the anchor time; the search roots at the
    /// destination and times decrease.
    ArriveBy,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::DepartAfter => Direction::ArriveBy,
            Direction::ArriveBy => Direction::DepartAfter,
        }
    }
}

/// A two-leg request: origin to a mandatory intermediate stop, a stay of
/// fixed length, then intermediate to destination.
#[derive(Debug, Clone)]
pub struct RoutingQuery {
    pub origin: Point<f64>,
    pub intermediate: Point<f64>,
    pub destination: Point<f64>,
    /// Anchor time: departure for [`Direction::DepartAfter`] on the first
    /// leg, required arrival at the intermediate stop for
    /// [`Direction::ArriveBy`].
    pub time: Time,
    pub direction: Direction,
    /// Seconds spent at the intermediate stop before the second leg.
    pub stay_seconds: Time,
    /// Category filter crediting POIs on the first leg.
    pub first_filter: CategorySet,
    /// Category filter crediting POIs on the second leg.
    pub second_filter: CategorySet,
    pub category_match: CategoryMatch,
    pub max_itineraries: usize,
    /// Multiplier on the remaining-cost estimate in the priority key.
    /// Values above 1.0 trade optimality for speed.
    pub heuristic_weight: f64,
    pub max_weight: f64,
    pub disable_heuristic: bool,
    pub use_transit: bool,
    pub require_accessible: bool,
    pub search_window: Time,
    pub timeouts: Vec<f64>,
}

impl RoutingQuery {
    pub fn new(
        origin: Point<f64>,
        intermediate: Point<f64>,
        destination: Point<f64>,
        departure: NaiveDateTime,
    ) -> Self {
        Self::at_timestamp(
            origin,
            intermediate,
            destination,
            departure.and_utc().timestamp(),
        )
    }

    pub fn at_timestamp(
        origin: Point<f64>,
        intermediate: Point<f64>,
        destination: Point<f64>,
        time: Time,
    ) -> Self {
        RoutingQuery {
            origin,
            intermediate,
            destination,
            time,
            direction: Direction::DepartAfter,
            stay_seconds: 0,
            first_filter: CategorySet::ALL,
            second_filter: CategorySet::ALL,
            category_match: CategoryMatch::default(),
            max_itineraries: 3,
            heuristic_weight: 1.0,
            max_weight: f64::MAX,
            disable_heuristic: false,
            use_transit: true,
            require_accessible: false,
            search_window: DEFAULT_SEARCH_WINDOW,
            timeouts: DEFAULT_TIMEOUTS.to_vec(),
        }
    }
}

/// Immutable parameters of one leg's search. Built once per leg from the
/// request; retries (accessibility relaxation) derive a fresh value instead
/// of mutating a shared one.
#[derive(Debug, Clone)]
pub struct LegQuery {
    /// Root of the search space. The destination vertex for arrive-by legs.
    pub search_origin: NodeIndex,
    /// Acceptance vertex of the search space.
    pub search_target: NodeIndex,
    pub direction: Direction,
    /// Simulated time at `search_origin`.
    pub time: Time,
    /// Prune labels past this time (before it for arrive-by legs).
    pub worst_time: Time,
    pub filter: CategorySet,
    pub category_match: CategoryMatch,
    pub max_itineraries: usize,
    pub heuristic_weight: f64,
    pub max_weight: f64,
    pub disable_heuristic: bool,
    pub use_transit: bool,
    pub require_accessible: bool,
    pub accessibility_relaxed: bool,
    pub timeouts: Vec<f64>,
}

impl LegQuery {
    /// The first leg: origin to the intermediate stop, oriented by the
    /// request direction.
    ///
    /// # Errors
    ///
    /// [`Error::VertexNotFound`] when either endpoint fails to resolve.
    /// Fatal for the whole request.
    pub fn first(query: &RoutingQuery, graph: &TransportGraph) -> Result<Self, Error> {
        let origin = graph.resolve(query.origin)?;
        let intermediate = graph.resolve(query.intermediate)?;
        let (search_origin, search_target) = match query.direction {
            Direction::DepartAfter => (origin, intermediate),
            Direction::ArriveBy => (intermediate, origin),
        };
        let worst_time = match query.direction {
            Direction::DepartAfter => query.time + query.search_window,
            Direction::ArriveBy => query.time - query.search_window,
        };
        Ok(LegQuery {
            search_origin,
            search_target,
            direction: query.direction,
            time: query.time,
            worst_time,
            filter: query.first_filter,
            ..Self::shared(query)
        })
    }

    /// The second leg: intermediate stop to destination, always
    /// depart-after, anchored at the first leg's arrival plus the stay.
    ///
    /// # Errors
    ///
    /// [`Error::VertexNotFound`] when either endpoint fails to resolve.
    pub fn second(query: &RoutingQuery, graph: &TransportGraph, depart_at: Time) -> Result<Self, Error> {
        let intermediate = graph.resolve(query.intermediate)?;
        let destination = graph.resolve(query.destination)?;
        Ok(LegQuery {
            search_origin: intermediate,
            search_target: destination,
            direction: Direction::DepartAfter,
            time: depart_at,
            worst_time: depart_at + query.search_window,
            filter: query.second_filter,
            ..Self::shared(query)
        })
    }

    fn shared(query: &RoutingQuery) -> Self {
        LegQuery {
            search_origin: NodeIndex::end(),
            search_target: NodeIndex::end(),
            direction: Direction::DepartAfter,
            time: 0,
            worst_time: 0,
            filter: CategorySet::ALL,
            category_match: query.category_match,
            max_itineraries: query.max_itineraries,
            heuristic_weight: query.heuristic_weight,
            max_weight: query.max_weight,
            disable_heuristic: query.disable_heuristic,
            use_transit: query.use_transit,
            require_accessible: query.require_accessible,
            accessibility_relaxed: false,
            timeouts: query.timeouts.clone(),
        }
    }

    /// A copy of this leg with accessibility constraints relaxed, for the
    /// retry after an accessible-only search found nothing.
    pub fn relaxed(&self) -> Self {
        LegQuery {
            accessibility_relaxed: true,
            ..self.clone()
        }
    }

    pub fn traverse_options(&self) -> TraverseOptions {
        TraverseOptions {
            direction: self.direction,
            accessible_only: self.require_accessible && !self.accessibility_relaxed,
        }
    }

    /// Is a label at time `t` outside the search window?
    pub fn worst_time_exceeded(&self, t: Time) -> bool {
        match self.direction {
            Direction::DepartAfter => t > self.worst_time,
            Direction::ArriveBy => t < self.worst_time,
        }
    }

    /// A path may not end on an interchange link: an itinerary finishing
    /// with a station-to-station transfer went one hop too far.
    pub fn accepts_terminal(&self, label: &Label) -> bool {
        label.mode != Some(TraverseMode::Transfer)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        _graph: &TransportGraph,
        search_origin: NodeIndex,
        search_target: NodeIndex,
        direction: Direction,
    ) -> Self {
        let worst_time = match direction {
            Direction::DepartAfter => DEFAULT_SEARCH_WINDOW,
            Direction::ArriveBy => -DEFAULT_SEARCH_WINDOW,
        };
        LegQuery {
            search_origin,
            search_target,
            direction,
            time: 0,
            worst_time,
            filter: CategorySet::ALL,
            category_match: CategoryMatch::default(),
            max_itineraries: 1,
            heuristic_weight: 1.0,
            max_weight: f64::MAX,
            disable_heuristic: false,
            use_transit: false,
            require_accessible: false,
            accessibility_relaxed: false,
            timeouts: Vec::new(),
        }
    }
}
