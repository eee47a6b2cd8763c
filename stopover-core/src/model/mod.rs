//! Data model: the transportation graph, the point-of-interest catalog and
//! the per-edge annotation index.

pub mod annotations;
pub mod network;
pub mod poi;

pub use annotations::EdgeAnnotations;
pub use network::{
    Departure, LinkKind, TransitLink, TransitVertex, TransportGraph, Traversal, TraverseMode,
    TraverseOptions,
};
pub use poi::{CategoryMatch, CategorySet, Poi, PoiCatalog};
