//! Two-leg request orchestration on top of the search engine: query types,
//! per-leg search with budgets and retries, itinerary assembly, waypoint
//! deduplication and the route splitter itself.

pub mod itinerary;
pub mod leg;
pub mod one_hop;
pub mod query;
pub mod waypoint;

pub use itinerary::{Itinerary, ItineraryLeg};
pub use leg::{LegPaths, find_leg_paths, resolve_leg};
pub use one_hop::{OneHopPlan, find_one_hop_path};
pub use query::{Direction, LegQuery, RoutingQuery};
pub use waypoint::{Waypoint, collect_waypoints};
