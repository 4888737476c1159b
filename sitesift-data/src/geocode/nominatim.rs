//! Nominatim-backed [`BoundarySource`].
//!
//! One `GET /search` request per country with `polygon_geojson=1`, taking
//! the first match. Nominatim's usage policy asks for a descriptive
//! user agent and modest request rates; the harvester issues a single
//! boundary lookup per country run, well inside those limits.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use geo::{Geometry, MultiPolygon};
use reqwest::Client;
use serde::Deserialize;
use sitesift_core::Boundary;

use super::{BoundarySource, GeocodeError};

/// Default user agent for geocoding requests.
pub const DEFAULT_USER_AGENT: &str = "sitesift/0.1 (heritage site survey)";

/// Public Nominatim instance.
const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`NominatimClient`].
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL of the Nominatim instance.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Country names that geocode better under a different query string.
    pub aliases: HashMap<String, String>,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            aliases: HashMap::new(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration pointing at the given instance.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Register an alternate query string for a country name.
    #[must_use]
    pub fn with_alias(mut self, country: impl Into<String>, query: impl Into<String>) -> Self {
        self.aliases.insert(country.into(), query.into());
        self
    }
}

/// HTTP implementation of [`BoundarySource`] against Nominatim.
#[derive(Debug)]
pub struct NominatimClient {
    client: Client,
    config: NominatimConfig,
}

impl Default for NominatimClient {
    fn default() -> Self {
        Self::with_config(NominatimConfig::default())
    }
}

impl NominatimClient {
    /// Construct a client against the public Nominatim instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a client with explicit configuration.
    #[must_use]
    pub fn with_config(config: NominatimConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .expect("client builder only fails with invalid configuration");
        Self { client, config }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    fn query_name<'a>(&'a self, country: &'a str) -> &'a str {
        self.config
            .aliases
            .get(country)
            .map_or(country, String::as_str)
    }

    fn convert_error(&self, error: &reqwest::Error, country: &str) -> GeocodeError {
        if error.is_timeout() {
            return GeocodeError::Timeout {
                country: country.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return GeocodeError::Http {
                country: country.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        GeocodeError::Network {
            country: country.to_owned(),
            message: error.to_string(),
        }
    }
}

/// One match in a Nominatim search response. Fields the harvester does not
/// consume are left out; serde ignores them.
#[derive(Debug, Deserialize)]
struct SearchResult {
    geojson: geojson::Geometry,
}

fn boundary_from_results(
    country: &str,
    results: Vec<SearchResult>,
) -> Result<Boundary, GeocodeError> {
    let first = results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NotFound {
            country: country.to_owned(),
        })?;

    let geometry = Geometry::try_from(first.geojson).map_err(|err| GeocodeError::Parse {
        country: country.to_owned(),
        message: err.to_string(),
    })?;

    let shape = match geometry {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
        Geometry::MultiPolygon(multi) => multi,
        other => {
            return Err(GeocodeError::UnsupportedGeometry {
                country: country.to_owned(),
                kind: geometry_kind(&other),
            });
        }
    };

    Boundary::new(shape).map_err(|_| GeocodeError::EmptyGeometry {
        country: country.to_owned(),
    })
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[async_trait]
impl BoundarySource for NominatimClient {
    async fn resolve(&self, country: &str) -> Result<Boundary, GeocodeError> {
        let results: Vec<SearchResult> = self
            .client
            .get(self.search_url())
            .query(&[
                ("q", self.query_name(country)),
                ("format", "jsonv2"),
                ("polygon_geojson", "1"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|err| self.convert_error(&err, country))?
            .error_for_status()
            .map_err(|err| self.convert_error(&err, country))?
            .json()
            .await
            .map_err(|err| GeocodeError::Parse {
                country: country.to_owned(),
                message: err.to_string(),
            })?;

        boundary_from_results(country, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_from(json: &str) -> Vec<SearchResult> {
        serde_json::from_str(json).expect("should deserialise")
    }

    #[test]
    fn polygon_match_becomes_a_boundary() {
        let results = results_from(
            r#"[{
                "display_name": "Luxembourg",
                "geojson": {
                    "type": "Polygon",
                    "coordinates": [[[5.7, 49.4], [6.5, 49.4], [6.5, 50.2], [5.7, 50.2], [5.7, 49.4]]]
                }
            }]"#,
        );

        let boundary = boundary_from_results("Luxembourg", results).expect("should resolve");
        let rect = boundary.bounding_rect();
        assert!((rect.min().x - 5.7).abs() < 1.0e-9);
        assert!((rect.max().y - 50.2).abs() < 1.0e-9);
    }

    #[test]
    fn multipolygon_match_is_kept_whole() {
        let results = results_from(
            r#"[{
                "geojson": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
                        [[[3.0, 0.0], [4.0, 0.0], [4.0, 1.0], [3.0, 1.0], [3.0, 0.0]]]
                    ]
                }
            }]"#,
        );

        let boundary = boundary_from_results("Islandia", results).expect("should resolve");
        assert_eq!(boundary.shape().0.len(), 2);
    }

    #[test]
    fn empty_response_reports_not_found() {
        let err = boundary_from_results("Atlantis", Vec::new()).expect_err("should fail");
        assert!(matches!(err, GeocodeError::NotFound { country } if country == "Atlantis"));
    }

    #[test]
    fn point_match_is_rejected() {
        let results = results_from(
            r#"[{"geojson": {"type": "Point", "coordinates": [3.0, 50.0]}}]"#,
        );
        let err = boundary_from_results("Somewhere", results).expect_err("should fail");
        assert!(matches!(
            err,
            GeocodeError::UnsupportedGeometry { kind: "Point", .. }
        ));
    }

    #[test]
    fn aliases_rewrite_the_query_name() {
        let client = NominatimClient::with_config(
            NominatimConfig::default().with_alias("Georgia", "Georgia, Caucasus"),
        );
        assert_eq!(client.query_name("Georgia"), "Georgia, Caucasus");
        assert_eq!(client.query_name("France"), "France");
    }

    #[test]
    fn search_url_strips_trailing_slash() {
        let client =
            NominatimClient::with_config(NominatimConfig::new("https://geo.example.com/"));
        assert_eq!(client.search_url(), "https://geo.example.com/search");
    }
}
