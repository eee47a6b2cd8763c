//! Point-of-interest catalog.

use geo::Point;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{PoiId, Quality};

/// Number of POI categories in the domain (categories `0..=6`).
pub const CATEGORY_COUNT: u32 = 7;

/// Bitmask over the POI categories `0..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategorySet(u32);

/// How a leg's category filter is matched against a POI's categories.
///
/// The default follows the two-leg planner: a POI scores if any requested
/// category bit is present. `AllOf` reproduces the stricter mask-equality
/// behaviour of the single-leg variant and exists as a configuration choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryMatch {
    #[default]
    AnyOf,
    AllOf,
}

impl CategorySet {
    /// Every known category.
    pub const ALL: CategorySet = CategorySet((1 << CATEGORY_COUNT) - 1);

    /// Build a set from category numbers. Values outside `0..=6` are
    /// dropped, matching the request parser.
    pub fn from_categories<I: IntoIterator<Item = u32>>(categories: I) -> Self {
        let mut bits = 0;
        for c in categories {
            if c < CATEGORY_COUNT {
                bits |= 1 << c;
            }
        }
        CategorySet(bits)
    }

    /// Build from a raw bitmask, rejecting bits above the known categories.
    pub fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(CategorySet(bits))
        } else {
            None
        }
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, category: u32) -> bool {
        category < CATEGORY_COUNT && self.0 & (1 << category) != 0
    }

    /// Test a POI's categories against this filter under the given rule.
    pub fn matches(self, rule: CategoryMatch, poi_categories: CategorySet) -> bool {
        match rule {
            CategoryMatch::AnyOf => self.0 & poi_categories.0 != 0,
            CategoryMatch::AllOf => !self.is_empty() && poi_categories.0 & self.0 == self.0,
        }
    }
}

/// One point of interest. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Poi {
    pub id: PoiId,
    pub geometry: Point<f64>,
    pub categories: CategorySet,
    pub score: Quality,
}

/// Read-only mapping from POI id to its record.
///
/// Lookups never fail: an unknown id simply earns no credit.
#[derive(Debug, Clone, Default)]
pub struct PoiCatalog {
    points: HashMap<PoiId, Poi>,
}

impl PoiCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<I: IntoIterator<Item = Poi>>(points: I) -> Self {
        Self {
            points: points.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn insert(&mut self, poi: Poi) -> Option<Poi> {
        self.points.insert(poi.id, poi)
    }

    pub fn get(&self, id: PoiId) -> Option<&Poi> {
        self.points.get(&id)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_categories_are_dropped() {
        let set = CategorySet::from_categories([1, 3, 9, 42]);
        assert!(set.contains(1));
        assert!(set.contains(3));
        assert_eq!(set.bits(), 0b1010);
    }

    #[test]
    fn from_bits_rejects_unknown_bits() {
        assert!(CategorySet::from_bits(0b0111_1111).is_some());
        assert!(CategorySet::from_bits(0b1000_0000).is_none());
    }

    #[test]
    fn any_of_matches_on_overlap() {
        let filter = CategorySet::from_categories([0, 2]);
        let poi = CategorySet::from_categories([2, 5]);
        assert!(filter.matches(CategoryMatch::AnyOf, poi));
        assert!(!filter.matches(CategoryMatch::AnyOf, CategorySet::from_categories([1])));
    }

    #[test]
    fn all_of_requires_every_filter_bit() {
        let filter = CategorySet::from_categories([0, 2]);
        assert!(filter.matches(CategoryMatch::AllOf, CategorySet::from_categories([0, 2, 4])));
        assert!(!filter.matches(CategoryMatch::AllOf, CategorySet::from_categories([2])));
        // An empty filter matches nothing under either rule.
        let empty = CategorySet::default();
        assert!(!empty.matches(CategoryMatch::AllOf, filter));
        assert!(!empty.matches(CategoryMatch::AnyOf, filter));
    }

    #[test]
    fn catalog_lookup_is_by_id() {
        let catalog = PoiCatalog::from_points([Poi {
            id: 7,
            geometry: Point::new(30.31, 59.94),
            categories: CategorySet::from_categories([1]),
            score: 2.5,
        }]);
        assert_eq!(catalog.get(7).map(|p| p.id), Some(7));
        assert!(catalog.get(8).is_none());
    }
}
