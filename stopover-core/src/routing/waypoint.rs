//! Deduplicated visit points along a set of paths.
//!
//! Coordinates are quantized to fixed-point with seven decimal digits
//! (roughly centimetre resolution), which makes equality and hashing exact.
//! The timestamp rides along as payload: two waypoints at the same spot are
//! the same waypoint, and the later visit wins.

use hashbrown::HashMap;
use serde::Serialize;

use crate::Time;
use crate::search::Path;

const COORD_SCALE: f64 = 10_000_000.0;

/// One visited location with the (latest) time it was reached.
#[derive(Debug, Clone, Copy, Eq, Serialize)]
pub struct Waypoint {
    /// Latitude in 1e-7 degree units.
    pub lat_e7: i32,
    /// Longitude in 1e-7 degree units.
    pub lon_e7: i32,
    pub time: Time,
}

impl Waypoint {
    pub fn new(lon: f64, lat: f64, time: Time) -> Self {
        Waypoint {
            lat_e7: (lat * COORD_SCALE) as i32,
            lon_e7: (lon * COORD_SCALE) as i32,
            time,
        }
    }

    pub fn lat(&self) -> f64 {
        f64::from(self.lat_e7) / COORD_SCALE
    }

    pub fn lon(&self) -> f64 {
        f64::from(self.lon_e7) / COORD_SCALE
    }
}

// Identity is the quantized position only; the timestamp is payload.
impl PartialEq for Waypoint {
    fn eq(&self, other: &Self) -> bool {
        self.lat_e7 == other.lat_e7 && self.lon_e7 == other.lon_e7
    }
}

impl std::hash::Hash for Waypoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.lat_e7.hash(state);
        self.lon_e7.hash(state);
    }
}

/// Collect the distinct locations visited by `paths`. Revisits keep the
/// greater timestamp. Order is unspecified.
pub fn collect_waypoints(paths: &[Path]) -> Vec<Waypoint> {
    let mut latest: HashMap<(i32, i32), Time> = HashMap::new();
    for path in paths {
        for state in &path.states {
            let w = Waypoint::new(state.point.x(), state.point.y(), state.time);
            latest
                .entry((w.lat_e7, w.lon_e7))
                .and_modify(|t| *t = (*t).max(state.time))
                .or_insert(state.time);
        }
    }
    latest
        .into_iter()
        .map(|((lat_e7, lon_e7), time)| Waypoint {
            lat_e7,
            lon_e7,
            time,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransportGraph;
    use crate::routing::query::Direction;
    use crate::search::{Label, LabelArena, Path};
    use geo::Point;

    #[test]
    fn quantization_defines_identity() {
        let a = Waypoint::new(30.1234567, 59.7654321, 100);
        let b = Waypoint::new(30.1234567, 59.7654321, 999);
        let c = Waypoint::new(30.1234568, 59.7654321, 100);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sub_resolution_jitter_collapses() {
        // Differences beyond the seventh decimal are not representable.
        let a = Waypoint::new(30.12345670, 59.0, 0);
        let b = Waypoint::new(30.123456704, 59.0, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn revisits_keep_the_greater_timestamp() {
        let mut graph = TransportGraph::new();
        let v = graph.add_vertex("v", Point::new(30.0, 59.0));
        let w = graph.add_vertex("w", Point::new(30.01, 59.0));
        let mut arena = LabelArena::new();

        // Two paths crossing the same vertex at different times.
        let early = arena.push(Label::root(v, 100));
        let late_root = arena.push(Label::root(w, 150));
        let late = arena.push(Label {
            vertex: v,
            time: 400,
            parent: Some(late_root),
            ..Label::root(v, 0)
        });

        let paths = vec![
            Path::from_label(early, &arena, &graph, Direction::DepartAfter),
            Path::from_label(late, &arena, &graph, Direction::DepartAfter),
        ];
        let mut points = collect_waypoints(&paths);
        points.sort_by_key(|p| p.lon_e7);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, 400); // v: later of 100 and 400
        assert_eq!(points[1].time, 150); // w
    }
}
