//! Raw features returned by the spatial-query service.
//!
//! A [`RawFeature`] is one unprocessed element from a tile query: a stable
//! external identifier, a geometry and an open-ended tag map. The extractor
//! turns it into zero or one normalised [`crate::SiteRecord`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use geo::{Centroid, Coord, LineString, Point, Polygon};
use thiserror::Error;

/// The element families exposed by the query service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    /// A single point.
    Node,
    /// An ordered chain of points.
    Way,
    /// A grouping of other elements.
    Relation,
}

impl ElementKind {
    /// The wire name used by the query service.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned when parsing a [`FeatureId`] from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFeatureIdError {
    /// The text was not of the form `kind/number`.
    #[error("feature id must look like `node/123`, got {text:?}")]
    Malformed {
        /// The rejected input.
        text: String,
    },
}

/// Stable external identifier of a feature.
///
/// Rendered as `node/123`, `way/456` or `relation/789`. Identifiers are
/// unique within one element family, so the kind is part of the key.
///
/// # Examples
/// ```
/// use sitesift_core::{ElementKind, FeatureId};
///
/// let id: FeatureId = "way/42".parse()?;
/// assert_eq!(id, FeatureId::new(ElementKind::Way, 42));
/// assert_eq!(id.to_string(), "way/42");
/// # Ok::<(), sitesift_core::ParseFeatureIdError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId {
    /// Element family.
    pub kind: ElementKind,
    /// Numeric identifier within the family.
    pub id: u64,
}

impl FeatureId {
    /// Construct an identifier from its parts.
    #[must_use]
    pub fn new(kind: ElementKind, id: u64) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

impl FromStr for FeatureId {
    type Err = ParseFeatureIdError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseFeatureIdError::Malformed {
            text: text.to_owned(),
        };
        let (kind, number) = text.split_once('/').ok_or_else(malformed)?;
        let kind = match kind {
            "node" => ElementKind::Node,
            "way" => ElementKind::Way,
            "relation" => ElementKind::Relation,
            _ => return Err(malformed()),
        };
        let id = number.parse().map_err(|_| malformed())?;
        Ok(Self { kind, id })
    }
}

/// Feature geometry as returned by the query service.
///
/// Coordinates are WGS84 with `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawGeometry {
    /// A single point (nodes).
    Point(Coord<f64>),
    /// The vertex chain of a way, or the flattened member vertices of a
    /// relation.
    Outline(Vec<Coord<f64>>),
}

impl RawGeometry {
    /// Representative point of the geometry.
    ///
    /// Points are returned as-is. A closed outline is treated as a polygon
    /// and an open one as a line; both reduce to their centroid. Returns
    /// `None` when the outline is empty.
    #[must_use]
    pub fn centroid(&self) -> Option<Coord<f64>> {
        match self {
            Self::Point(coord) => Some(*coord),
            Self::Outline(vertices) => outline_centroid(vertices),
        }
    }
}

fn outline_centroid(vertices: &[Coord<f64>]) -> Option<Coord<f64>> {
    match vertices {
        [] => None,
        [only] => Some(*only),
        [first, .., last] if first == last && vertices.len() >= 4 => {
            let ring = LineString::from(vertices.to_vec());
            Polygon::new(ring, Vec::new()).centroid().map(Point::into)
        }
        _ => LineString::from(vertices.to_vec()).centroid().map(Point::into),
    }
}

/// One unprocessed element from a tile query.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    /// Stable external identifier.
    pub id: FeatureId,
    /// Geometry of the element.
    pub geometry: RawGeometry,
    /// Open-ended key/value tags.
    pub tags: HashMap<String, String>,
}

impl RawFeature {
    /// Construct a feature from its parts.
    #[must_use]
    pub fn new(id: FeatureId, geometry: RawGeometry, tags: HashMap<String, String>) -> Self {
        Self { id, geometry, tags }
    }

    /// Look up a tag value.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}
