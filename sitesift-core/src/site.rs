//! Normalised site records.

use geo::Coord;

use crate::dataset::Dataset;
use crate::feature::FeatureId;

/// Dataset-specific classification of a site.
///
/// Each variant carries the columns its dataset exports beyond the shared
/// ones. Classification is derived deterministically from a feature's tags;
/// identical tags always produce the same variant and labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// An active place of worship.
    Worship {
        /// The `religion` tag, when present.
        religion: Option<String>,
        /// First of `denomination` / `religion:denomination`.
        denomination: Option<String>,
    },
    /// A historic religious site.
    ReligiousHistory {
        /// Site-type label, e.g. `historic:chapel`.
        site_type: String,
        /// Originating civilisation, when tagged.
        civilization: Option<String>,
    },
    /// A pre-modern conflict or military site.
    Conflict {
        /// Conflict-type label, e.g. `pre_modern_battlefield`.
        conflict_type: String,
    },
}

impl Classification {
    /// The dataset this classification belongs to.
    #[must_use]
    pub fn dataset(&self) -> Dataset {
        match self {
            Self::Worship { .. } => Dataset::Worship,
            Self::ReligiousHistory { .. } => Dataset::ReligiousHistory,
            Self::Conflict { .. } => Dataset::Conflict,
        }
    }
}

/// The normalised, exported representation of one real-world site.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sitesift_core::{Classification, ElementKind, FeatureId, SiteRecord};
///
/// let record = SiteRecord {
///     id: FeatureId::new(ElementKind::Node, 1),
///     name: Some("St Nicholas".into()),
///     classification: Classification::Worship {
///         religion: Some("christian".into()),
///         denomination: None,
///     },
///     location: Coord { x: 4.35, y: 50.85 },
///     wikidata: None,
///     wikipedia: None,
/// };
/// assert_eq!(record.id.to_string(), "node/1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    /// Stable external identifier; unique within a country result set.
    pub id: FeatureId,
    /// Display name, when any name tag is present.
    pub name: Option<String>,
    /// Dataset-specific classification.
    pub classification: Classification,
    /// WGS84 centroid with `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Wikidata item reference, when tagged.
    pub wikidata: Option<String>,
    /// Wikipedia article reference, when tagged.
    pub wikipedia: Option<String>,
}
