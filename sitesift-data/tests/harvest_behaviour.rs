//! End-to-end harvest behaviour against stubbed services.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use geo::{Coord, MultiPolygon, polygon};
use sitesift_core::{
    Boundary, Dataset, ElementKind, FeatureId, RawFeature, RawGeometry,
};
use sitesift_data::{
    BoundarySource, FeatureQueryError, FeatureSource, GeocodeError, HarvestConfig, HarvestError,
    Harvester, RetryPolicy,
};

/// A boundary source that always hands out the same shape.
struct FixedBoundary(Boundary);

#[async_trait]
impl BoundarySource for FixedBoundary {
    async fn resolve(&self, _country: &str) -> Result<Boundary, GeocodeError> {
        Ok(self.0.clone())
    }
}

/// A boundary source that never resolves.
struct NoBoundary;

#[async_trait]
impl BoundarySource for NoBoundary {
    async fn resolve(&self, country: &str) -> Result<Boundary, GeocodeError> {
        Err(GeocodeError::NotFound {
            country: country.to_owned(),
        })
    }
}

/// Canned per-tile features, with optional always-failing tiles.
#[derive(Default)]
struct ScriptedFeatures {
    by_tile: HashMap<usize, Vec<RawFeature>>,
    failing_tiles: HashSet<usize>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedFeatures {
    fn with_tile(mut self, index: usize, features: Vec<RawFeature>) -> Self {
        self.by_tile.insert(index, features);
        self
    }

    fn with_failing_tile(mut self, index: usize) -> Self {
        self.failing_tiles.insert(index);
        self
    }

    fn attempts_for(&self, index: usize) -> usize {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .iter()
            .filter(|&&called| called == index)
            .count()
    }
}

#[async_trait]
impl FeatureSource for ScriptedFeatures {
    async fn fetch_tile(
        &self,
        tile: &sitesift_core::Tile,
        _filters: &[sitesift_core::TagFilter],
    ) -> Result<Vec<RawFeature>, FeatureQueryError> {
        self.calls
            .lock()
            .expect("call log should not be poisoned")
            .push(tile.index);
        if self.failing_tiles.contains(&tile.index) {
            return Err(FeatureQueryError::Network {
                message: "connection reset".to_owned(),
            });
        }
        Ok(self.by_tile.get(&tile.index).cloned().unwrap_or_default())
    }
}

fn rect_boundary(width: f64, height: f64) -> Boundary {
    let shape = polygon![
        (x: 0.0, y: 0.0),
        (x: width, y: 0.0),
        (x: width, y: height),
        (x: 0.0, y: height),
    ];
    Boundary::new(MultiPolygon::new(vec![shape])).expect("boundary should build")
}

fn worship_node(id: u64, name: &str, x: f64, y: f64) -> RawFeature {
    RawFeature::new(
        FeatureId::new(ElementKind::Node, id),
        RawGeometry::Point(Coord { x, y }),
        HashMap::from([
            ("amenity".to_owned(), "place_of_worship".to_owned()),
            ("name".to_owned(), name.to_owned()),
        ]),
    )
}

fn quick_config() -> HarvestConfig {
    HarvestConfig {
        tile_edge_deg: 1.0,
        workers: 4,
        retry: RetryPolicy::new(3)
            .with_delays(Duration::from_millis(1), Duration::from_millis(2)),
    }
}

#[tokio::test]
async fn small_country_needs_exactly_one_tile() {
    let boundaries = FixedBoundary(rect_boundary(0.5, 0.4));
    let features = ScriptedFeatures::default().with_tile(
        0,
        vec![
            worship_node(1, "St Anne", 0.1, 0.1),
            worship_node(2, "St Bruno", 0.3, 0.2),
        ],
    );
    let harvester = Harvester::new(&boundaries, &features, quick_config());

    let harvest = harvester
        .harvest(Dataset::Worship, "Smallland")
        .await
        .expect("harvest should succeed");

    assert_eq!(harvest.tiles_total, 1);
    assert_eq!(harvest.tiles_failed, 0);
    assert_eq!(harvest.records.len(), 2);
    assert_eq!(features.attempts_for(0), 1);
}

#[tokio::test]
async fn border_straddling_feature_is_reported_once() {
    // Two columns of one tile each; the same feature id comes back from
    // both, carrying whichever name that tile's query saw first.
    let boundaries = FixedBoundary(rect_boundary(1.6, 1.0));
    let features = ScriptedFeatures::default()
        .with_tile(
            0,
            vec![
                worship_node(10, "Border Abbey (west copy)", 0.99, 0.5),
                worship_node(11, "West Chapel", 0.2, 0.2),
            ],
        )
        .with_tile(
            1,
            vec![
                worship_node(10, "Border Abbey (east copy)", 1.01, 0.5),
                worship_node(12, "East Chapel", 1.4, 0.2),
            ],
        );
    let harvester = Harvester::new(&boundaries, &features, quick_config());

    let harvest = harvester
        .harvest(Dataset::Worship, "Twintiles")
        .await
        .expect("harvest should succeed");

    assert_eq!(harvest.tiles_total, 2);
    assert_eq!(harvest.records.len(), 3);

    let kept = harvest
        .records
        .get(FeatureId::new(ElementKind::Node, 10))
        .expect("straddling feature should survive");
    assert_eq!(kept.name.as_deref(), Some("Border Abbey (west copy)"));
}

#[tokio::test]
async fn failed_tile_degrades_to_empty_but_run_completes() {
    let boundaries = FixedBoundary(rect_boundary(1.6, 1.0));
    let features = ScriptedFeatures::default()
        .with_tile(0, vec![worship_node(1, "Surviving Chapel", 0.5, 0.5)])
        .with_failing_tile(1);
    let harvester = Harvester::new(&boundaries, &features, quick_config());

    let harvest = harvester
        .harvest(Dataset::Worship, "Flakyland")
        .await
        .expect("run should complete despite the failed tile");

    assert_eq!(harvest.tiles_total, 2);
    assert_eq!(harvest.tiles_failed, 1);
    assert_eq!(harvest.records.len(), 1);
    // The failing tile burned the whole retry budget.
    assert_eq!(features.attempts_for(1), 3);
}

#[tokio::test]
async fn unresolvable_country_aborts_only_that_run() {
    let boundaries = NoBoundary;
    let features = ScriptedFeatures::default();
    let harvester = Harvester::new(&boundaries, &features, quick_config());

    let err = harvester
        .harvest(Dataset::Worship, "Atlantis")
        .await
        .expect_err("harvest should fail");
    assert!(matches!(err, HarvestError::Boundary { country, .. } if country == "Atlantis"));
    // No tile queries were issued.
    assert_eq!(features.attempts_for(0), 0);
}

#[tokio::test]
async fn extraction_drops_features_that_do_not_classify() {
    let mut unclassified = worship_node(5, "Just a shed", 0.1, 0.1);
    unclassified.tags.remove("amenity");

    let boundaries = FixedBoundary(rect_boundary(0.5, 0.5));
    let features = ScriptedFeatures::default()
        .with_tile(0, vec![unclassified, worship_node(6, "Kept", 0.2, 0.2)]);
    let harvester = Harvester::new(&boundaries, &features, quick_config());

    let harvest = harvester
        .harvest(Dataset::Worship, "Filterland")
        .await
        .expect("harvest should succeed");
    assert_eq!(harvest.records.len(), 1);
    assert!(
        harvest
            .records
            .get(FeatureId::new(ElementKind::Node, 6))
            .is_some()
    );
}
