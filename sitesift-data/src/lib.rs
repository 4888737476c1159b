//! Data access and orchestration for the sitesift harvester.
//!
//! Responsibilities:
//! - Resolve country boundaries through the geocoding service.
//! - Run bounded, retried per-tile feature queries against the spatial
//!   query service.
//! - Merge tile results into per-country sets and export them as CSV.
//!
//! Boundaries:
//! - Domain rules (tiling, extraction, deduplication) live in
//!   `sitesift-core`; this crate supplies the I/O around them.
//! - External services are reached through the [`geocode::BoundarySource`]
//!   and [`overpass::FeatureSource`] traits so tests can substitute stubs.

#![forbid(unsafe_code)]

pub mod export;
pub mod geocode;
pub mod harvest;
pub mod overpass;
pub mod retry;

pub use export::{ExportError, read_country, write_country};
pub use geocode::{BoundarySource, GeocodeError, NominatimClient, NominatimConfig};
pub use harvest::{CountryHarvest, HarvestConfig, HarvestError, Harvester};
pub use overpass::{FeatureQueryError, FeatureSource, OverpassClient, OverpassConfig};
pub use retry::{RetryPolicy, with_retry};
