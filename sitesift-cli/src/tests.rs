//! Argument parsing and configuration resolution tests.

use std::time::Duration;

use clap::Parser;
use rstest::rstest;

use super::*;

fn harvest_args(argv: &[&str]) -> HarvestArgs {
    let mut full = vec!["sitesift", "harvest"];
    full.extend_from_slice(argv);
    let cli = Cli::try_parse_from(full).expect("arguments should parse");
    match cli.command {
        Command::Harvest(args) => args,
    }
}

#[test]
fn defaults_cover_the_whole_survey() {
    let config = HarvestRunConfig::try_from(harvest_args(&[])).expect("should resolve");

    assert_eq!(config.datasets, Dataset::ALL.to_vec());
    assert_eq!(config.countries.len(), DEFAULT_COUNTRIES.len());
    assert_eq!(config.countries[0], "Austria");
    assert_eq!(config.harvest.workers, 4);
    assert_eq!(config.harvest.retry.max_attempts, 3);
    assert!((config.harvest.tile_edge_deg - 0.8).abs() < f64::EPSILON);
    assert_eq!(config.output_root, PathBuf::from("."));
}

#[test]
fn dataset_and_country_flags_narrow_the_run() {
    let config = HarvestRunConfig::try_from(harvest_args(&[
        "--dataset",
        "conflict",
        "--country",
        "Belgium",
        "--country",
        "Luxembourg",
    ]))
    .expect("should resolve");

    assert_eq!(config.datasets, vec![Dataset::Conflict]);
    assert_eq!(config.countries, vec!["Belgium", "Luxembourg"]);
}

#[rstest]
#[case("worship", Dataset::Worship)]
#[case("religious-history", Dataset::ReligiousHistory)]
#[case("conflict", Dataset::Conflict)]
fn dataset_names_map_to_their_dataset(#[case] flag: &str, #[case] expected: Dataset) {
    let config = HarvestRunConfig::try_from(harvest_args(&["--dataset", flag]))
        .expect("should resolve");
    assert_eq!(config.datasets, vec![expected]);
}

#[test]
fn tuning_flags_reach_the_harvest_config() {
    let config = HarvestRunConfig::try_from(harvest_args(&[
        "--tile-edge-deg",
        "0.4",
        "--workers",
        "8",
        "--retries",
        "5",
        "--backoff-min-ms",
        "100",
        "--backoff-max-ms",
        "250",
    ]))
    .expect("should resolve");

    assert!((config.harvest.tile_edge_deg - 0.4).abs() < f64::EPSILON);
    assert_eq!(config.harvest.workers, 8);
    assert_eq!(config.harvest.retry.max_attempts, 5);
    assert_eq!(config.harvest.retry.min_delay, Duration::from_millis(100));
    assert_eq!(config.harvest.retry.max_delay, Duration::from_millis(250));
}

#[rstest]
#[case("0")]
#[case("-0.8")]
#[case("nan")]
fn unusable_tile_edges_are_rejected(#[case] edge: &str) {
    let err = HarvestRunConfig::try_from(harvest_args(&["--tile-edge-deg", edge]))
        .expect_err("should fail");
    assert!(matches!(err, CliError::InvalidTileEdge { .. }));
}

#[test]
fn inverted_backoff_bounds_are_rejected() {
    let err = HarvestRunConfig::try_from(harvest_args(&[
        "--backoff-min-ms",
        "900",
        "--backoff-max-ms",
        "200",
    ]))
    .expect_err("should fail");
    assert!(matches!(
        err,
        CliError::InvalidBackoff {
            min_ms: 900,
            max_ms: 200,
        }
    ));
}

#[test]
fn endpoint_overrides_reach_the_clients() {
    let config = HarvestRunConfig::try_from(harvest_args(&[
        "--geocoder-url",
        "https://geo.example.com",
        "--overpass-url",
        "https://overpass.example.com/api/interpreter",
    ]))
    .expect("should resolve");

    assert_eq!(config.geocoder.base_url, "https://geo.example.com");
    assert_eq!(
        config.overpass.endpoint,
        "https://overpass.example.com/api/interpreter"
    );
}

#[test]
fn zero_workers_clamp_to_one() {
    let config = HarvestRunConfig::try_from(harvest_args(&["--workers", "0"]))
        .expect("should resolve");
    assert_eq!(config.harvest.workers, 1);
}
