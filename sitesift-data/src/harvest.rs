//! Per-country harvest orchestration.
//!
//! One country run: resolve the boundary, cut the tile grid, fan the tile
//! queries out over a bounded worker pool, extract records, and merge the
//! outcomes in tile order into a deduplicated result set. Workers share no
//! mutable state; each returns its own tile's records and the merge happens
//! at a single aggregation point once the fan-out completes.

use futures_util::{StreamExt, stream};
use log::{info, warn};
use sitesift_core::{
    CountryResultSet, Dataset, SiteRecord, TagFilter, Tile, TileError, TileGrid, extract,
};
use thiserror::Error;

use crate::geocode::{BoundarySource, GeocodeError};
use crate::overpass::FeatureSource;
use crate::retry::{RetryPolicy, with_retry};

/// Tunable knobs for a harvest run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarvestConfig {
    /// Tile edge length in degrees.
    pub tile_edge_deg: f64,
    /// Bound on concurrent tile queries.
    pub workers: usize,
    /// Retry bounds for each tile query.
    pub retry: RetryPolicy,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            tile_edge_deg: 0.8,
            workers: 4,
            retry: RetryPolicy::default(),
        }
    }
}

/// Errors that abort one country's run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// The country name did not resolve to a usable boundary.
    #[error("could not resolve a boundary for {country:?}")]
    Boundary {
        /// The country whose run was aborted.
        country: String,
        /// The geocoding failure.
        #[source]
        source: GeocodeError,
    },
    /// The boundary could not be tiled.
    #[error(transparent)]
    Tiling(#[from] TileError),
}

/// The finalised outcome of one country run.
#[derive(Debug)]
pub struct CountryHarvest {
    /// Country name as configured.
    pub country: String,
    /// Deduplicated records across all tiles.
    pub records: CountryResultSet,
    /// Number of tiles queried.
    pub tiles_total: usize,
    /// Tiles that yielded nothing because every attempt failed.
    pub tiles_failed: usize,
}

/// Records extracted from one tile, or the marker of a degraded tile.
#[derive(Debug)]
struct TileOutcome {
    index: usize,
    records: Vec<SiteRecord>,
    failed: bool,
}

/// Drives per-country harvests against a boundary source and a feature
/// source.
///
/// Countries are independent: the harvester holds no cross-country state,
/// so callers may run them back to back or interleave them freely.
pub struct Harvester<'a, B, F> {
    boundaries: &'a B,
    features: &'a F,
    config: HarvestConfig,
}

impl<'a, B, F> Harvester<'a, B, F>
where
    B: BoundarySource,
    F: FeatureSource,
{
    /// Construct a harvester over the given sources.
    pub fn new(boundaries: &'a B, features: &'a F, config: HarvestConfig) -> Self {
        Self {
            boundaries,
            features,
            config,
        }
    }

    /// Harvest one dataset for one country.
    ///
    /// Failed tiles degrade to empty results and are counted in the
    /// returned [`CountryHarvest`]; only boundary resolution and tiling
    /// failures abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Boundary`] when geocoding fails and
    /// [`HarvestError::Tiling`] when the configured edge length is
    /// unusable.
    pub async fn harvest(
        &self,
        dataset: Dataset,
        country: &str,
    ) -> Result<CountryHarvest, HarvestError> {
        let boundary =
            self.boundaries
                .resolve(country)
                .await
                .map_err(|source| HarvestError::Boundary {
                    country: country.to_owned(),
                    source,
                })?;

        let grid = TileGrid::cover(&boundary, self.config.tile_edge_deg)?;
        let tiles_total = grid.len();
        info!(
            "{country}: querying {tiles_total} tiles of {} degrees for {dataset}",
            self.config.tile_edge_deg
        );

        let filters = dataset.tag_filters();
        let mut outcomes: Vec<TileOutcome> = stream::iter(grid)
            .map(|tile| self.query_tile(dataset, tile, &filters, country))
            .buffer_unordered(self.config.workers.max(1))
            .collect()
            .await;

        // Completion order is arbitrary; merging in tile order keeps the
        // first-seen duplicate policy deterministic.
        outcomes.sort_by_key(|outcome| outcome.index);

        let mut records = CountryResultSet::new();
        let mut tiles_failed = 0;
        for outcome in outcomes {
            if outcome.failed {
                tiles_failed += 1;
            }
            records.merge(outcome.records);
        }

        info!(
            "{country}: {} distinct sites from {tiles_total} tiles ({tiles_failed} failed)",
            records.len()
        );
        Ok(CountryHarvest {
            country: country.to_owned(),
            records,
            tiles_total,
            tiles_failed,
        })
    }

    async fn query_tile(
        &self,
        dataset: Dataset,
        tile: Tile,
        filters: &[TagFilter],
        country: &str,
    ) -> TileOutcome {
        let attempt = || self.features.fetch_tile(&tile, filters);
        match with_retry(self.config.retry, |error| error.is_transient(), attempt).await {
            Ok(features) => TileOutcome {
                index: tile.index,
                records: features
                    .iter()
                    .filter_map(|feature| extract(dataset, feature))
                    .collect(),
                failed: false,
            },
            Err(error) => {
                warn!(
                    "{country}: tile {} yields no data after {} attempts: {error}",
                    tile.index, self.config.retry.max_attempts
                );
                TileOutcome {
                    index: tile.index,
                    records: Vec::new(),
                    failed: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_the_survey_settings() {
        let config = HarvestConfig::default();
        assert!((config.tile_edge_deg - 0.8).abs() < f64::EPSILON);
        assert_eq!(config.workers, 4);
        assert_eq!(config.retry.max_attempts, 3);
    }
}
