//! The harvested dataset categories and their tag filters.
//!
//! Each dataset names the tag filters its tile queries select on, the
//! directory its exports land in, and the slug used in output file names.
//! The directory and file naming mirror the survey's published layout, so
//! they are fixed here rather than configurable.

use std::fmt;

/// Values of the `building` tag that mark a religious building.
pub const RELIGIOUS_BUILDING_VALUES: &[&str] = &[
    "church",
    "chapel",
    "cathedral",
    "monastery",
    "abbey",
    "basilica",
    "mosque",
    "synagogue",
    "temple",
    "shrine",
];

/// Values of the `historic` tag that mark a religious historic site.
pub const RELIGIOUS_HISTORIC_VALUES: &[&str] = &[
    "church",
    "chapel",
    "cathedral",
    "monastery",
    "abbey",
    "basilica",
    "mosque",
    "synagogue",
    "temple",
    "wayside_shrine",
    "wayside_cross",
    "religious",
];

/// Values of the `historic` tag that mark a conflict or military site.
pub const CONFLICT_HISTORIC_VALUES: &[&str] = &[
    "battlefield",
    "battle_site",
    "battle",
    "war_memorial",
    "memorial",
    "monument",
    "fort",
    "castle",
    "bunker",
    "trench",
    "pillbox",
    "tank",
    "aircraft",
    "ship",
    "ruins",
    "bomb_crater",
];

/// Bare marker values some mappers use instead of a concrete category.
pub const TRUTHY_VALUES: &[&str] = &["yes", "1", "true"];

/// One alternative in a tile query's tag selection.
///
/// A tile query unions the elements matching any filter in the dataset's
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// The tag must equal one fixed value.
    Equals {
        /// Tag key.
        key: &'static str,
        /// Required value.
        value: &'static str,
    },
    /// The tag must hold one of the listed values.
    OneOf {
        /// Tag key.
        key: &'static str,
        /// Accepted values.
        values: Vec<&'static str>,
    },
    /// The tag must be present, with any value.
    Present {
        /// Tag key.
        key: &'static str,
    },
}

/// The dataset categories the harvester produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Active places of worship.
    Worship,
    /// Historic religious sites.
    ReligiousHistory,
    /// Pre-modern conflict and military sites.
    Conflict,
}

impl Dataset {
    /// All datasets, in export order.
    pub const ALL: [Self; 3] = [Self::Worship, Self::ReligiousHistory, Self::Conflict];

    /// Slug used in output file names.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Worship => "places_of_worship",
            Self::ReligiousHistory => "religious_historic_sites",
            Self::Conflict => "historic_conflict_preWW_sites",
        }
    }

    /// Name of the per-dataset output directory.
    #[must_use]
    pub fn output_dir(self) -> &'static str {
        match self {
            Self::Worship => "europe_places_of_worship_tiled",
            Self::ReligiousHistory => "europe_religious_historic_sites_tiled",
            Self::Conflict => "europe_historic_conflict_preWW_sites_tiled",
        }
    }

    /// The tag filters a tile query selects on for this dataset.
    #[must_use]
    pub fn tag_filters(self) -> Vec<TagFilter> {
        match self {
            Self::Worship => vec![TagFilter::Equals {
                key: "amenity",
                value: "place_of_worship",
            }],
            Self::ReligiousHistory => vec![
                TagFilter::OneOf {
                    key: "historic",
                    values: with_truthy(RELIGIOUS_HISTORIC_VALUES),
                },
                TagFilter::Equals {
                    key: "amenity",
                    value: "place_of_worship",
                },
                TagFilter::OneOf {
                    key: "building",
                    values: RELIGIOUS_BUILDING_VALUES.to_vec(),
                },
            ],
            Self::Conflict => vec![
                TagFilter::OneOf {
                    key: "historic",
                    values: with_truthy(CONFLICT_HISTORIC_VALUES),
                },
                TagFilter::Present { key: "military" },
                TagFilter::Equals {
                    key: "landuse",
                    value: "military",
                },
            ],
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

fn with_truthy(values: &[&'static str]) -> Vec<&'static str> {
    values.iter().chain(TRUTHY_VALUES).copied().collect()
}
