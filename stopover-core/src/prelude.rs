//! Convenience re-exports for typical use of the crate.

pub use crate::error::Error;

// Re-export key components
pub use crate::loading::{load_edge_annotations, load_poi_catalog};
pub use crate::metrics::{NoopMetrics, SearchMetrics};
pub use crate::model::{
    CategoryMatch, CategorySet, Departure, EdgeAnnotations, Poi, PoiCatalog, TransportGraph,
    TraverseMode,
};
pub use crate::routing::{
    Direction, Itinerary, ItineraryLeg, OneHopPlan, RoutingQuery, Waypoint, find_one_hop_path,
};
pub use crate::search::{Path, SearchEngine, SearchOutcome};

// Core scalar types
pub use crate::PoiId;
pub use crate::Quality;
pub use crate::Time; // seconds since the Unix epoch
