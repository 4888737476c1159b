//! Overpass JSON response types and conversion into raw features.

use std::collections::HashMap;

use geo::Coord;
use serde::Deserialize;
use sitesift_core::{ElementKind, FeatureId, RawFeature, RawGeometry};

use super::FeatureQueryError;

/// Top-level Overpass JSON payload.
#[derive(Debug, Deserialize)]
pub(super) struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
    /// Server remark; carries the reason when a query was cut short.
    #[serde(default)]
    remark: Option<String>,
}

impl OverpassResponse {
    /// Convert the payload into raw features.
    ///
    /// A remark alongside an empty element list means the interpreter shed
    /// the query; that surfaces as [`FeatureQueryError::Rejected`] so the
    /// dispatcher retries it. Elements of unknown shape are skipped.
    pub(super) fn into_features(self) -> Result<Vec<RawFeature>, FeatureQueryError> {
        if self.elements.is_empty()
            && let Some(remark) = self.remark
        {
            return Err(FeatureQueryError::Rejected { remark });
        }
        Ok(self
            .elements
            .into_iter()
            .filter_map(OverpassElement::into_raw_feature)
            .collect())
    }
}

/// One element in an Overpass response.
#[derive(Debug, Deserialize)]
pub(super) struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    center: Option<LatLon>,
    /// Way vertex chain under `out geom`; entries may be null when the
    /// server elides vertices.
    #[serde(default)]
    geometry: Option<Vec<Option<LatLon>>>,
    #[serde(default)]
    members: Option<Vec<Member>>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(super) struct LatLon {
    lat: f64,
    lon: f64,
}

impl From<LatLon> for Coord<f64> {
    fn from(position: LatLon) -> Self {
        Self {
            x: position.lon,
            y: position.lat,
        }
    }
}

/// Relation member; only the inlined geometry is consumed.
#[derive(Debug, Deserialize)]
pub(super) struct Member {
    #[serde(default)]
    geometry: Option<Vec<Option<LatLon>>>,
}

impl OverpassElement {
    fn into_raw_feature(self) -> Option<RawFeature> {
        let kind = match self.kind.as_str() {
            "node" => ElementKind::Node,
            "way" => ElementKind::Way,
            "relation" => ElementKind::Relation,
            _ => return None,
        };
        let id = FeatureId::new(kind, self.id);

        let geometry = match kind {
            ElementKind::Node => RawGeometry::Point(Coord {
                x: self.lon?,
                y: self.lat?,
            }),
            ElementKind::Way => self
                .geometry
                .map(|vertices| RawGeometry::Outline(flatten(vertices)))
                .or_else(|| self.center.map(|center| RawGeometry::Point(center.into())))?,
            ElementKind::Relation => relation_geometry(self.members, self.center)?,
        };

        Some(RawFeature::new(id, geometry, self.tags))
    }
}

/// A relation's shape is the flattened vertex cloud of its members; the
/// precomputed centre is the fallback when no member geometry was inlined.
fn relation_geometry(
    members: Option<Vec<Member>>,
    center: Option<LatLon>,
) -> Option<RawGeometry> {
    let vertices: Vec<Coord<f64>> = members
        .into_iter()
        .flatten()
        .filter_map(|member| member.geometry)
        .flat_map(flatten)
        .collect();
    if vertices.is_empty() {
        return center.map(|center| RawGeometry::Point(center.into()));
    }
    Some(RawGeometry::Outline(vertices))
}

fn flatten(vertices: Vec<Option<LatLon>>) -> Vec<Coord<f64>> {
    vertices
        .into_iter()
        .flatten()
        .map(Coord::from)
        .collect()
}
