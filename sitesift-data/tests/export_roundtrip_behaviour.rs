//! Export round-trip behaviour: a written file reads back to the same
//! records.

use geo::Coord;
use sitesift_core::{
    Classification, CountryResultSet, Dataset, ElementKind, FeatureId, SiteRecord,
};
use sitesift_data::{read_country, write_country};

fn record(id: FeatureId, name: Option<&str>, classification: Classification) -> SiteRecord {
    SiteRecord {
        id,
        name: name.map(str::to_owned),
        classification,
        location: Coord {
            x: 13.404954,
            y: 52.520008,
        },
        wikidata: Some("Q64".to_owned()),
        wikipedia: None,
    }
}

fn assert_round_trips(dataset: Dataset, records: Vec<SiteRecord>) {
    let output_root = tempfile::tempdir().expect("temp dir should create");
    let set: CountryResultSet = records.into_iter().collect();

    let path = write_country(output_root.path(), "Testland", dataset, &set)
        .expect("export should succeed");
    let read_back = read_country(&path, dataset).expect("file should read back");

    assert_eq!(read_back.len(), set.len());
    for original in set.records() {
        let restored = read_back
            .iter()
            .find(|candidate| candidate.id == original.id)
            .expect("every exported record should read back");
        assert_eq!(restored.classification, original.classification);
        assert_eq!(restored.name, original.name);
        assert!((restored.location.x - original.location.x).abs() < 1.0e-9);
        assert!((restored.location.y - original.location.y).abs() < 1.0e-9);
        assert_eq!(restored.wikidata, original.wikidata);
    }
}

#[test]
fn worship_files_round_trip() {
    assert_round_trips(
        Dataset::Worship,
        vec![
            record(
                FeatureId::new(ElementKind::Node, 1),
                Some("St Mary"),
                Classification::Worship {
                    religion: Some("christian".into()),
                    denomination: Some("catholic".into()),
                },
            ),
            record(
                FeatureId::new(ElementKind::Way, 2),
                None,
                Classification::Worship {
                    religion: None,
                    denomination: None,
                },
            ),
        ],
    );
}

#[test]
fn religious_history_files_round_trip() {
    assert_round_trips(
        Dataset::ReligiousHistory,
        vec![
            record(
                FeatureId::new(ElementKind::Relation, 3),
                Some("Roman Temple"),
                Classification::ReligiousHistory {
                    site_type: "historic:temple".into(),
                    civilization: Some("ancient_roman".into()),
                },
            ),
            record(
                FeatureId::new(ElementKind::Way, 4),
                Some("Wayside Cross"),
                Classification::ReligiousHistory {
                    site_type: "historic:wayside_cross".into(),
                    civilization: None,
                },
            ),
        ],
    );
}

#[test]
fn conflict_files_round_trip() {
    assert_round_trips(
        Dataset::Conflict,
        vec![record(
            FeatureId::new(ElementKind::Node, 5),
            Some("Old Battlefield"),
            Classification::Conflict {
                conflict_type: "pre_modern_battlefield".into(),
            },
        )],
    );
}

#[test]
fn files_land_in_the_dataset_directory() {
    let output_root = tempfile::tempdir().expect("temp dir should create");
    let set = CountryResultSet::new();

    let path = write_country(output_root.path(), "United Kingdom", Dataset::Worship, &set)
        .expect("export should succeed");

    assert!(path.ends_with(
        "europe_places_of_worship_tiled/United_Kingdom_places_of_worship_tiled.csv"
    ));
    assert!(path.exists());
    let read_back = read_country(&path, Dataset::Worship).expect("empty file should read back");
    assert!(read_back.is_empty());
}
