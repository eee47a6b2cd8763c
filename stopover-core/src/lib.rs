//! Point-of-interest aware one-hop itinerary search.
//!
//! Given an origin, a destination and a mandatory intermediate stop, this
//! crate computes two itineraries (origin -> intermediate and
//! intermediate -> destination) over a time-dependent transportation graph.
//! Each leg is optimized jointly on elapsed time and on "quality" collected
//! by passing near category-tagged points of interest, under a wall-clock
//! search budget.
//!
//! The search itself is a label-setting A* with a two-criterion Pareto
//! dominance rule; see [`search`] for the engine and [`routing`] for the
//! two-leg orchestration.

pub mod error;
pub mod loading;
pub mod metrics;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod search;

pub use error::Error;
pub use model::{CategoryMatch, CategorySet, EdgeAnnotations, Poi, PoiCatalog, TransportGraph};
pub use routing::{OneHopPlan, RoutingQuery, find_one_hop_path};

/// Simulated clock time, in seconds since the Unix epoch.
pub type Time = i64;

/// Identifier of a point of interest in the catalog.
pub type PoiId = u32;

/// Accumulated POI score along a path.
pub type Quality = f32;

/// Once at least one path to the target is known, stop exploring branches
/// whose priority exceeds the found path weight by this factor.
pub const OVERSEARCH_MULTIPLIER: f64 = 4.0;

/// Maximum distance, in metres, between a requested location and the graph
/// vertex it resolves to.
pub const MAX_SNAP_DISTANCE: f64 = 500.0;

/// Upper bound on street-mode speed in metres per second. The straight-line
/// heuristic divides by this, so it must not underestimate any street link.
pub const MAX_STREET_SPEED_MPS: f64 = 30.0;

/// Fixed weight penalty applied when boarding a transit service.
pub const BOARD_COST: f64 = 120.0;

/// How many alternative departures a single timetable edge may yield per
/// traversal.
pub const MAX_BOARDINGS_PER_TRAVERSAL: usize = 3;
