//! Boundary resolution through a geocoding service.
//!
//! The [`BoundarySource`] trait abstracts the geocode-by-name request so the
//! harvester can run against stub boundaries in tests. The production
//! implementation is [`NominatimClient`].

mod nominatim;

pub use nominatim::{DEFAULT_USER_AGENT, NominatimClient, NominatimConfig};

use async_trait::async_trait;
use sitesift_core::Boundary;
use thiserror::Error;

/// Errors returned by [`BoundarySource::resolve`].
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The service returned no match for the country name.
    #[error("no boundary found for {country:?}")]
    NotFound {
        /// The name that was looked up.
        country: String,
    },
    /// The request exceeded the configured timeout.
    #[error("geocoding request for {country:?} timed out after {timeout_secs}s")]
    Timeout {
        /// The name that was looked up.
        country: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with an error status.
    #[error("geocoding service returned HTTP {status} for {country:?}: {message}")]
    Http {
        /// The name that was looked up.
        country: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The service could not be reached.
    #[error("failed to reach the geocoding service for {country:?}: {message}")]
    Network {
        /// The name that was looked up.
        country: String,
        /// Error detail.
        message: String,
    },
    /// The response body was not in the expected shape.
    #[error("geocoding response for {country:?} could not be parsed: {message}")]
    Parse {
        /// The name that was looked up.
        country: String,
        /// Error detail.
        message: String,
    },
    /// The match carried a geometry the harvester cannot tile.
    #[error("geocoder returned unsupported geometry {kind} for {country:?}")]
    UnsupportedGeometry {
        /// The name that was looked up.
        country: String,
        /// GeoJSON geometry type name.
        kind: &'static str,
    },
    /// The match carried a polygon with no extent.
    #[error("boundary geometry for {country:?} is empty")]
    EmptyGeometry {
        /// The name that was looked up.
        country: String,
    },
}

/// Resolve a country name to its polygon boundary.
#[async_trait]
pub trait BoundarySource {
    /// Geocode `country` and return its boundary.
    ///
    /// # Errors
    ///
    /// Returns a [`GeocodeError`] when the lookup fails or yields no usable
    /// polygon; the caller aborts that country's run and carries on with the
    /// rest.
    async fn resolve(&self, country: &str) -> Result<Boundary, GeocodeError>;
}
