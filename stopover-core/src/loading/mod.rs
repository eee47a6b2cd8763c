//! Loading of POI catalogs and edge annotations from JSON files.
//!
//! Catalog format: an array of `{"id", "x", "y", "score", "type"}` records,
//! with `type` listing category numbers. Annotation format: an array of
//! `{"id", "places"}` records keyed by edge index. Both formats are strict:
//! duplicate ids and unknown categories fail the load instead of being
//! papered over.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use geo::Point;
use log::info;
use petgraph::graph::EdgeIndex;
use serde::Deserialize;

use crate::model::poi::CATEGORY_COUNT;
use crate::model::{CategorySet, EdgeAnnotations, Poi, PoiCatalog};
use crate::{Error, PoiId, Quality};

#[derive(Debug, Deserialize)]
struct PoiRecord {
    id: PoiId,
    /// Longitude, degrees.
    x: f64,
    /// Latitude, degrees.
    y: f64,
    score: Quality,
    #[serde(rename = "type")]
    categories: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    id: u32,
    places: Vec<PoiId>,
}

/// Load a POI catalog from a JSON file.
///
/// # Errors
///
/// I/O and JSON errors pass through; duplicate ids, unknown categories and
/// non-finite scores are [`Error::InvalidData`].
pub fn load_poi_catalog(path: impl AsRef<Path>) -> Result<PoiCatalog, Error> {
    let catalog = read_poi_catalog(BufReader::new(File::open(path.as_ref())?))?;
    info!("loaded {} POIs from {}", catalog.len(), path.as_ref().display());
    Ok(catalog)
}

pub fn read_poi_catalog<R: Read>(reader: R) -> Result<PoiCatalog, Error> {
    let records: Vec<PoiRecord> = serde_json::from_reader(reader)?;
    let mut catalog = PoiCatalog::new();
    for record in records {
        for &c in &record.categories {
            if c >= CATEGORY_COUNT {
                return Err(Error::InvalidData(format!(
                    "POI {} has unknown category {c}",
                    record.id
                )));
            }
        }
        if !record.score.is_finite() {
            return Err(Error::InvalidData(format!(
                "POI {} has a non-finite score",
                record.id
            )));
        }
        let poi = Poi {
            id: record.id,
            geometry: Point::new(record.x, record.y),
            categories: CategorySet::from_categories(record.categories),
            score: record.score,
        };
        if catalog.insert(poi).is_some() {
            return Err(Error::InvalidData(format!("duplicate POI id {}", record.id)));
        }
    }
    Ok(catalog)
}

/// Load edge annotations from a JSON file. Ids referencing POIs absent from
/// the catalog are tolerated here; they simply never earn credit.
///
/// # Errors
///
/// I/O and JSON errors pass through; a duplicate edge id is
/// [`Error::InvalidData`].
pub fn load_edge_annotations(path: impl AsRef<Path>) -> Result<EdgeAnnotations, Error> {
    let annotations = read_edge_annotations(BufReader::new(File::open(path.as_ref())?))?;
    info!(
        "loaded annotations for {} edges from {}",
        annotations.len(),
        path.as_ref().display()
    );
    Ok(annotations)
}

pub fn read_edge_annotations<R: Read>(reader: R) -> Result<EdgeAnnotations, Error> {
    let records: Vec<EdgeRecord> = serde_json::from_reader(reader)?;
    let mut annotations = EdgeAnnotations::new();
    for record in records {
        let edge = EdgeIndex::new(record.id as usize);
        if !annotations.points_on(edge).is_empty() {
            return Err(Error::InvalidData(format!(
                "duplicate annotation for edge {}",
                record.id
            )));
        }
        annotations.annotate(edge, record.places);
    }
    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_parses_records() {
        let json = r#"[
            {"id": 1, "x": 30.31, "y": 59.94, "score": 2.5, "type": [1, 3]},
            {"id": 2, "x": 30.32, "y": 59.95, "score": 1.0, "type": []}
        ]"#;
        let catalog = read_poi_catalog(json.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        let poi = catalog.get(1).unwrap();
        assert!(poi.categories.contains(1));
        assert!(poi.categories.contains(3));
        assert_eq!(poi.score, 2.5);
        assert!(catalog.get(2).unwrap().categories.is_empty());
    }

    #[test]
    fn duplicate_poi_id_fails() {
        let json = r#"[
            {"id": 1, "x": 30.0, "y": 59.0, "score": 1.0, "type": [0]},
            {"id": 1, "x": 30.1, "y": 59.1, "score": 2.0, "type": [1]}
        ]"#;
        let err = read_poi_catalog(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn unknown_category_fails() {
        let json = r#"[{"id": 1, "x": 30.0, "y": 59.0, "score": 1.0, "type": [7]}]"#;
        let err = read_poi_catalog(json.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = read_poi_catalog("not json".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::JsonError(_)));
    }

    #[test]
    fn annotations_parse_and_reject_duplicates() {
        let json = r#"[
            {"id": 0, "places": [1, 2]},
            {"id": 4, "places": [3]}
        ]"#;
        let annotations = read_edge_annotations(json.as_bytes()).unwrap();
        assert_eq!(annotations.points_on(EdgeIndex::new(0)), &[1, 2]);
        assert_eq!(annotations.points_on(EdgeIndex::new(4)), &[3]);

        let dup = r#"[
            {"id": 0, "places": [1]},
            {"id": 0, "places": [2]}
        ]"#;
        let err = read_edge_annotations(dup.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }
}
