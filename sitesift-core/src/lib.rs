//! Core domain types for the sitesift harvester.
//!
//! Responsibilities:
//! - Model country boundaries, tile grids, raw map features and the
//!   normalised site records derived from them.
//! - Hold the ordered extraction and classification rule tables.
//! - Merge per-tile results into a duplicate-free per-country set.
//!
//! Boundaries:
//! - No I/O lives here; HTTP clients and file writers belong to
//!   `sitesift-data`.
//! - No global mutable state; every component receives its inputs
//!   explicitly.

#![forbid(unsafe_code)]

pub mod boundary;
pub mod dataset;
pub mod dedup;
pub mod extract;
pub mod feature;
pub mod site;
pub mod tile;

pub use boundary::{Boundary, BoundaryError};
pub use dataset::{Dataset, TagFilter};
pub use dedup::CountryResultSet;
pub use extract::extract;
pub use feature::{ElementKind, FeatureId, ParseFeatureIdError, RawFeature, RawGeometry};
pub use site::{Classification, SiteRecord};
pub use tile::{Tile, TileError, TileGrid};
