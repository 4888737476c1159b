//! Merging per-tile results into one duplicate-free country set.
//!
//! A feature whose geometry spans, or sits exactly on, a tile edge is
//! returned by every adjacent tile query. Merging keys records by their
//! external identifier; on collision the record from the lowest tile index
//! wins, so the outcome is independent of query completion order.

use std::collections::BTreeMap;

use crate::feature::FeatureId;
use crate::site::SiteRecord;

/// The deduplicated record set for one country.
///
/// Identifiers are unique within the set; inserting a second record under an
/// existing identifier keeps the first. Iteration is ordered by identifier.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sitesift_core::{Classification, CountryResultSet, ElementKind, FeatureId, SiteRecord};
///
/// let record = SiteRecord {
///     id: FeatureId::new(ElementKind::Node, 1),
///     name: None,
///     classification: Classification::Worship { religion: None, denomination: None },
///     location: Coord { x: 0.0, y: 0.0 },
///     wikidata: None,
///     wikipedia: None,
/// };
/// let mut set = CountryResultSet::new();
/// assert!(set.insert(record.clone()));
/// assert!(!set.insert(record));
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryResultSet {
    records: BTreeMap<FeatureId, SiteRecord>,
}

impl CountryResultSet {
    /// An empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, keeping the existing one on identifier collision.
    ///
    /// Returns `true` when the record was inserted, `false` when a record
    /// with the same identifier was already present.
    pub fn insert(&mut self, record: SiteRecord) -> bool {
        match self.records.entry(record.id) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Merge a tile's records, first-seen wins.
    pub fn merge(&mut self, records: impl IntoIterator<Item = SiteRecord>) {
        for record in records {
            self.insert(record);
        }
    }

    /// Look up a record by identifier.
    #[must_use]
    pub fn get(&self, id: FeatureId) -> Option<&SiteRecord> {
        self.records.get(&id)
    }

    /// Number of distinct sites in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in identifier order.
    pub fn records(&self) -> impl Iterator<Item = &SiteRecord> {
        self.records.values()
    }
}

impl FromIterator<SiteRecord> for CountryResultSet {
    fn from_iter<I: IntoIterator<Item = SiteRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        set.merge(iter);
        set
    }
}
