//! Command-line interface for the sitesift harvester.
//!
//! The `harvest` subcommand walks the configured country list, harvests the
//! selected datasets and writes one CSV per country per dataset. Options
//! can come from CLI flags, configuration files or `SITESIFT_*` environment
//! variables.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sitesift_core::Dataset;
use sitesift_data::{
    ExportError, HarvestConfig, HarvestError, Harvester, NominatimClient, NominatimConfig,
    OverpassClient, OverpassConfig, RetryPolicy, write_country,
};

/// Countries harvested when none are given on the command line.
pub const DEFAULT_COUNTRIES: &[&str] = &[
    "Austria",
    "Belgium",
    "Bulgaria",
    "Czechia",
    "Denmark",
    "Finland",
    "France",
    "Germany",
    "Greece",
    "Hungary",
    "Italy",
    "Luxembourg",
    "Netherlands",
    "Norway",
    "Poland",
    "Portugal",
    "Romania",
    "Slovakia",
    "Spain",
    "Sweden",
    "Switzerland",
    "United Kingdom",
];

/// Run the sitesift CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] for argument or configuration problems, and for
/// the failures the multi-country run does not absorb.
pub async fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Harvest(args) => run_harvest(args.into_config()?).await,
    }
}

async fn run_harvest(config: HarvestRunConfig) -> Result<(), CliError> {
    let boundaries = NominatimClient::with_config(config.geocoder.clone());
    let features = OverpassClient::with_config(config.overpass.clone());
    let harvester = Harvester::new(&boundaries, &features, config.harvest);

    let mut degraded = 0usize;
    for country in &config.countries {
        for dataset in &config.datasets {
            match harvester.harvest(*dataset, country).await {
                Ok(harvest) => {
                    if harvest.tiles_failed > 0 {
                        degraded += 1;
                    }
                    match write_country(&config.output_root, country, *dataset, &harvest.records)
                    {
                        Ok(path) => info!(
                            "{country}: wrote {} sites to {}",
                            harvest.records.len(),
                            path.display()
                        ),
                        Err(export) if export.is_disk_full() => {
                            return Err(CliError::Export(export));
                        }
                        Err(export) => {
                            error!("{country}: export failed: {export}");
                            degraded += 1;
                        }
                    }
                }
                Err(HarvestError::Tiling(tiling)) => return Err(CliError::Tiling(tiling)),
                Err(harvest) => {
                    error!("{harvest}");
                    degraded += 1;
                }
            }
        }
    }
    if degraded > 0 {
        warn!("{degraded} country runs were degraded or skipped");
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "sitesift",
    about = "Harvest European heritage sites from OpenStreetMap into per-country spreadsheets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Query the configured countries and write per-country CSV files.
    Harvest(HarvestArgs),
}

/// Dataset selector on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
enum DatasetArg {
    /// Active places of worship.
    Worship,
    /// Historic religious sites.
    ReligiousHistory,
    /// Pre-modern conflict and military sites.
    Conflict,
}

impl From<DatasetArg> for Dataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::Worship => Self::Worship,
            DatasetArg::ReligiousHistory => Self::ReligiousHistory,
            DatasetArg::Conflict => Self::Conflict,
        }
    }
}

/// CLI arguments for the `harvest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Harvest the selected datasets for the selected countries. \
                 Every option can also come from configuration files or \
                 SITESIFT_* environment variables.",
    about = "Harvest heritage sites into per-country CSV files"
)]
#[ortho_config(prefix = "SITESIFT")]
struct HarvestArgs {
    /// Dataset to harvest; repeatable, defaults to all three.
    #[arg(long = "dataset", value_enum, value_name = "dataset")]
    #[serde(default)]
    datasets: Option<Vec<DatasetArg>>,
    /// Country to harvest; repeatable, defaults to the survey list.
    #[arg(long = "country", value_name = "name")]
    #[serde(default)]
    countries: Option<Vec<String>>,
    /// Tile edge length in degrees.
    #[arg(long, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    tile_edge_deg: Option<f64>,
    /// Bound on concurrent tile queries.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    workers: Option<usize>,
    /// Attempts per tile query, including the first.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    retries: Option<u32>,
    /// Shortest pause between attempts, in milliseconds.
    #[arg(long, value_name = "ms")]
    #[serde(default)]
    backoff_min_ms: Option<u64>,
    /// Longest pause between attempts, in milliseconds.
    #[arg(long, value_name = "ms")]
    #[serde(default)]
    backoff_max_ms: Option<u64>,
    /// Directory the per-dataset output directories are created under.
    #[arg(long, value_name = "path")]
    #[serde(default)]
    output_root: Option<PathBuf>,
    /// Base URL of the geocoding service.
    #[arg(long, value_name = "url")]
    #[serde(default)]
    geocoder_url: Option<String>,
    /// URL of the feature query interpreter.
    #[arg(long, value_name = "url")]
    #[serde(default)]
    overpass_url: Option<String>,
}

impl HarvestArgs {
    fn into_config(self) -> Result<HarvestRunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        HarvestRunConfig::try_from(merged)
    }
}

/// Fully resolved settings for one `harvest` invocation.
#[derive(Debug, Clone)]
struct HarvestRunConfig {
    datasets: Vec<Dataset>,
    countries: Vec<String>,
    output_root: PathBuf,
    harvest: HarvestConfig,
    geocoder: NominatimConfig,
    overpass: OverpassConfig,
}

impl TryFrom<HarvestArgs> for HarvestRunConfig {
    type Error = CliError;

    fn try_from(args: HarvestArgs) -> Result<Self, Self::Error> {
        let defaults = HarvestConfig::default();
        let tile_edge_deg = args.tile_edge_deg.unwrap_or(defaults.tile_edge_deg);
        if !tile_edge_deg.is_finite() || tile_edge_deg <= 0.0 {
            return Err(CliError::InvalidTileEdge {
                edge_deg: tile_edge_deg,
            });
        }

        let default_retry = RetryPolicy::default();
        let backoff_min_ms = args
            .backoff_min_ms
            .unwrap_or(default_retry.min_delay.as_millis() as u64);
        let backoff_max_ms = args
            .backoff_max_ms
            .unwrap_or(default_retry.max_delay.as_millis() as u64);
        if backoff_min_ms > backoff_max_ms {
            return Err(CliError::InvalidBackoff {
                min_ms: backoff_min_ms,
                max_ms: backoff_max_ms,
            });
        }

        let retry = RetryPolicy::new(args.retries.unwrap_or(default_retry.max_attempts))
            .with_delays(
                Duration::from_millis(backoff_min_ms),
                Duration::from_millis(backoff_max_ms),
            );

        let datasets = args.datasets.map_or_else(
            || Dataset::ALL.to_vec(),
            |selected| selected.into_iter().map(Dataset::from).collect(),
        );
        let countries = args.countries.unwrap_or_else(|| {
            DEFAULT_COUNTRIES.iter().map(|&name| name.to_owned()).collect()
        });

        let geocoder = args
            .geocoder_url
            .map_or_else(NominatimConfig::default, |url| NominatimConfig::new(url));
        let overpass = args
            .overpass_url
            .map_or_else(OverpassConfig::default, |url| OverpassConfig::new(url));

        Ok(Self {
            datasets,
            countries,
            output_root: args.output_root.unwrap_or_else(|| PathBuf::from(".")),
            harvest: HarvestConfig {
                tile_edge_deg,
                workers: args.workers.unwrap_or(defaults.workers).max(1),
                retry,
            },
            geocoder,
            overpass,
        })
    }
}

/// Errors emitted by the sitesift CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The tile edge length cannot produce a finite grid.
    #[error("tile edge length must be positive and finite, got {edge_deg}")]
    InvalidTileEdge {
        /// The rejected value.
        edge_deg: f64,
    },
    /// The backoff bounds are inverted.
    #[error("backoff bounds are inverted: {min_ms}ms > {max_ms}ms")]
    InvalidBackoff {
        /// Configured lower bound.
        min_ms: u64,
        /// Configured upper bound.
        max_ms: u64,
    },
    /// The tile grid could not be constructed.
    #[error(transparent)]
    Tiling(#[from] sitesift_core::TileError),
    /// An export failure the run cannot absorb.
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests;
