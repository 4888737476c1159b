//! Feature extraction: from raw tag maps to normalised site records.
//!
//! Extraction is a pure function of the feature's tags and geometry. Name
//! resolution walks an ordered preference list of name keys; classification
//! evaluates an ordered rule table per dataset, first match wins. Features
//! that classify as nothing are dropped.

use std::collections::HashMap;

use geo::Coord;

use crate::dataset::{
    Dataset, RELIGIOUS_BUILDING_VALUES, RELIGIOUS_HISTORIC_VALUES, TRUTHY_VALUES,
};
use crate::feature::RawFeature;
use crate::site::{Classification, SiteRecord};

/// Name tag keys, in preference order. The first present, non-empty value
/// becomes the record's name.
pub const NAME_KEYS: &[&str] = &[
    "name",
    "name:en",
    "alt_name",
    "old_name",
    "loc_name",
    "official_name",
];

/// Denomination tag keys, in preference order.
const DENOMINATION_KEYS: &[&str] = &["denomination", "religion:denomination"];

/// Civilisation tag keys, in preference order.
const CIVILIZATION_KEYS: &[&str] = &[
    "historic:civilization",
    "civilization",
    "archaeological_site:civilization",
    "culture",
];

/// Derive a normalised record from one raw feature, or drop it.
///
/// Returns `None` when the feature does not classify under `dataset`, or
/// when its geometry yields no usable centroid.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use geo::Coord;
/// use sitesift_core::{Dataset, ElementKind, FeatureId, RawFeature, RawGeometry, extract};
///
/// let feature = RawFeature::new(
///     FeatureId::new(ElementKind::Node, 5),
///     RawGeometry::Point(Coord { x: 2.35, y: 48.85 }),
///     HashMap::from([
///         ("amenity".into(), "place_of_worship".into()),
///         ("name".into(), "Notre-Dame".into()),
///     ]),
/// );
/// let record = extract(Dataset::Worship, &feature).unwrap();
/// assert_eq!(record.name.as_deref(), Some("Notre-Dame"));
/// ```
#[must_use]
pub fn extract(dataset: Dataset, feature: &RawFeature) -> Option<SiteRecord> {
    let classification = classify(dataset, feature)?;
    let location = feature.geometry.centroid()?;
    Some(assemble(feature, classification, location))
}

fn classify(dataset: Dataset, feature: &RawFeature) -> Option<Classification> {
    match dataset {
        Dataset::Worship => classify_worship(feature),
        Dataset::ReligiousHistory => classify_religious_history(feature),
        Dataset::Conflict => conflict::classify(feature).map(|conflict_type| {
            Classification::Conflict { conflict_type }
        }),
    }
}

fn assemble(
    feature: &RawFeature,
    classification: Classification,
    location: Coord<f64>,
) -> SiteRecord {
    SiteRecord {
        id: feature.id,
        name: resolve_name(&feature.tags),
        classification,
        location,
        wikidata: non_empty(feature.tag("wikidata")),
        wikipedia: non_empty(feature.tag("wikipedia")),
    }
}

/// First present, non-empty value among [`NAME_KEYS`].
#[must_use]
pub fn resolve_name(tags: &HashMap<String, String>) -> Option<String> {
    first_of(tags, NAME_KEYS)
}

fn classify_worship(feature: &RawFeature) -> Option<Classification> {
    let amenity = feature.tag("amenity")?;
    if !amenity.eq_ignore_ascii_case("place_of_worship") {
        return None;
    }
    Some(Classification::Worship {
        religion: non_empty(feature.tag("religion")),
        denomination: first_of(&feature.tags, DENOMINATION_KEYS),
    })
}

fn classify_religious_history(feature: &RawFeature) -> Option<Classification> {
    let site_type = religious_site_type(feature)?;
    Some(Classification::ReligiousHistory {
        site_type,
        civilization: first_of(&feature.tags, CIVILIZATION_KEYS),
    })
}

/// Ordered site-type rules for the historic religious dataset.
///
/// 1. A concrete religious `historic` value labels the site directly.
/// 2. A religious `building` value on a bare historic marker labels it as a
///    historic building.
/// 3. A place of worship carrying a bare historic marker falls back to a
///    generic label.
fn religious_site_type(feature: &RawFeature) -> Option<String> {
    let historic = lowered(feature.tag("historic"));
    if contains(RELIGIOUS_HISTORIC_VALUES, &historic) {
        return Some(format!("historic:{historic}"));
    }

    if !contains(TRUTHY_VALUES, &historic) {
        return None;
    }
    let building = lowered(feature.tag("building"));
    if contains(RELIGIOUS_BUILDING_VALUES, &building) {
        return Some(format!("historic_building:{building}"));
    }
    let amenity = lowered(feature.tag("amenity"));
    (amenity == "place_of_worship").then(|| "historic:place_of_worship".to_owned())
}

mod conflict {
    //! Conflict-type classification.
    //!
    //! A mention of a modern conflict anywhere in the feature's textual tags
    //! vetoes the feature outright; the remaining rules are evaluated in
    //! order and gate on a pre-modern conflict mention where the bare tag
    //! value is not conclusive on its own.

    use std::sync::LazyLock;

    use regex::Regex;

    use super::lowered;
    use crate::feature::RawFeature;

    /// Textual tag keys scanned for conflict-era mentions.
    const TEXT_KEYS: &[&str] = &[
        "name",
        "name:en",
        "alt_name",
        "description",
        "inscription",
        "note",
        "memorial",
        "memorial:conflict",
        "subject",
        "subject:wikidata",
        "wikidata",
        "wikipedia",
    ];

    static PRE_MODERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(concat!(
            r"(?i)(crusade|crusader|holy\s*war|templar|teutonic|hospitaller|",
            r"reconquista|reconquest|byzantine|ottoman|turkish\s+war|austro[-\s]*turkish|",
            r"habsburg[-\s]*ottoman|thirty\s*years'? war|hundred\s*years'? war|",
            r"napoleonic|napoleon|medieval|middle\s+ages|roman|frankish|carolingian|saxon\s+war)",
        ))
        .expect("pattern is valid")
    });

    static MODERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(concat!(
            r"(?i)(world\s*war|ww1|wwi|ww2|wwii|191[4-9]|1939|194[0-5]|cold\s*war|",
            r"korean\s*war|vietnam\s*war|gulf\s*war|iraq\s*war|afghanistan\s*war|nato)",
        ))
        .expect("pattern is valid")
    });

    pub(super) fn classify(feature: &RawFeature) -> Option<String> {
        let text = searchable_text(feature);
        if MODERN.is_match(&text) {
            return None;
        }
        let pre_modern = PRE_MODERN.is_match(&text);

        let historic = lowered(feature.tag("historic"));
        let military = lowered(feature.tag("military"));
        let landuse = lowered(feature.tag("landuse"));

        match historic.as_str() {
            "battlefield" | "battle_site" | "battle" => {
                return Some("pre_modern_battlefield".to_owned());
            }
            "war_memorial" => {
                return pre_modern.then(|| "pre_modern_war_memorial".to_owned());
            }
            "memorial" | "monument" => {
                return pre_modern.then(|| "pre_modern_memorial_or_monument".to_owned());
            }
            _ => {}
        }

        let fortification = matches!(
            historic.as_str(),
            "fort" | "castle" | "bunker" | "trench" | "pillbox" | "ruins"
        );
        if fortification && (pre_modern || landuse == "military") {
            return Some("pre_modern_fortification_or_military_site".to_owned());
        }

        if !military.is_empty() {
            return pre_modern.then(|| format!("pre_modern_military_site:{military}"));
        }
        if landuse == "military" {
            return pre_modern.then(|| "pre_modern_military_landuse".to_owned());
        }
        if matches!(
            historic.as_str(),
            "tank" | "aircraft" | "ship" | "bomb_crater"
        ) {
            return pre_modern.then(|| "pre_modern_war_object".to_owned());
        }
        if matches!(historic.as_str(), "yes" | "1" | "true") && pre_modern {
            return Some("pre_modern_historic_conflict_feature".to_owned());
        }
        None
    }

    fn searchable_text(feature: &RawFeature) -> String {
        let parts: Vec<&str> = TEXT_KEYS.iter().filter_map(|key| feature.tag(key)).collect();
        parts.join(" ").to_lowercase()
    }
}

fn first_of(tags: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| tags.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_owned)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn lowered(value: Option<&str>) -> String {
    value.unwrap_or_default().to_lowercase()
}

fn contains(values: &[&str], candidate: &str) -> bool {
    !candidate.is_empty() && values.contains(&candidate)
}
