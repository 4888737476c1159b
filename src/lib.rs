//! Facade crate for the sitesift heritage-site harvester.
//!
//! This crate re-exports the core domain types so downstream tools can depend
//! on a single crate name.

#![forbid(unsafe_code)]

pub use sitesift_core::{
    Boundary, Classification, CountryResultSet, Dataset, ElementKind, FeatureId, RawFeature,
    RawGeometry, SiteRecord, TagFilter, Tile, TileError, TileGrid,
};
