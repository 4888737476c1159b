//! Per-tile feature queries against the Overpass API.
//!
//! The [`FeatureSource`] trait abstracts one bounded feature query so the
//! harvester can run against canned features in tests. The production
//! implementation is [`OverpassClient`], which posts an Overpass QL program
//! scoped to the tile's bounding box and converts the JSON elements into
//! [`RawFeature`] values.

mod query;
mod response;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use sitesift_core::{RawFeature, TagFilter, Tile};
use thiserror::Error;

use query::build_query;
use response::OverpassResponse;

/// Default user agent for feature queries.
pub const DEFAULT_USER_AGENT: &str = "sitesift/0.1 (heritage site survey)";

/// Public Overpass interpreter endpoint.
const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default HTTP timeout in seconds; slightly above the server-side query
/// timeout so the server gets to answer first.
const DEFAULT_TIMEOUT_SECS: u64 = 110;

/// Server-side query timeout in seconds.
const DEFAULT_QUERY_TIMEOUT_SECS: u32 = 90;

/// Errors returned by [`FeatureSource::fetch_tile`].
#[derive(Debug, Error)]
pub enum FeatureQueryError {
    /// The request exceeded the configured timeout.
    #[error("feature query timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with an error status.
    #[error("feature service returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The service could not be reached.
    #[error("failed to reach the feature service: {message}")]
    Network {
        /// Error detail.
        message: String,
    },
    /// The response body was not in the expected shape.
    #[error("feature response could not be parsed: {message}")]
    Parse {
        /// Error detail.
        message: String,
    },
    /// The service answered but declined to run the query.
    #[error("feature service rejected the query: {remark}")]
    Rejected {
        /// The server's remark.
        remark: String,
    },
}

impl FeatureQueryError {
    /// Whether retrying the query may succeed.
    ///
    /// Rate-limit and server errors pass; client errors and malformed
    /// bodies do not. Rejections count as transient because the public
    /// interpreter sheds load with them.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::Rejected { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Parse { .. } => false,
        }
    }
}

/// Fetch the raw features inside one tile.
#[async_trait]
pub trait FeatureSource {
    /// Query the features matching `filters` inside `tile`.
    ///
    /// # Errors
    ///
    /// Returns a [`FeatureQueryError`] when the query fails; the dispatcher
    /// retries transient failures and records the tile as failed once the
    /// attempts are exhausted.
    async fn fetch_tile(
        &self,
        tile: &Tile,
        filters: &[TagFilter],
    ) -> Result<Vec<RawFeature>, FeatureQueryError>;
}

/// Configuration for [`OverpassClient`].
#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoint URL.
    pub endpoint: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Server-side query timeout in seconds.
    pub query_timeout_secs: u32,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OverpassConfig {
    /// Create a configuration pointing at the given interpreter.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the server-side query timeout.
    #[must_use]
    pub fn with_query_timeout_secs(mut self, secs: u32) -> Self {
        self.query_timeout_secs = secs;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP implementation of [`FeatureSource`] against the Overpass API.
#[derive(Debug)]
pub struct OverpassClient {
    client: Client,
    config: OverpassConfig,
}

impl Default for OverpassClient {
    fn default() -> Self {
        Self::with_config(OverpassConfig::default())
    }
}

impl OverpassClient {
    /// Construct a client against the public interpreter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a client with explicit configuration.
    #[must_use]
    pub fn with_config(config: OverpassConfig) -> Self {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .expect("client builder only fails with invalid configuration");
        Self { client, config }
    }

    fn convert_error(&self, error: &reqwest::Error) -> FeatureQueryError {
        if error.is_timeout() {
            return FeatureQueryError::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return FeatureQueryError::Http {
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        FeatureQueryError::Network {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl FeatureSource for OverpassClient {
    async fn fetch_tile(
        &self,
        tile: &Tile,
        filters: &[TagFilter],
    ) -> Result<Vec<RawFeature>, FeatureQueryError> {
        let program = build_query(tile, filters, self.config.query_timeout_secs);

        let response: OverpassResponse = self
            .client
            .post(&self.config.endpoint)
            .form(&[("data", program.as_str())])
            .send()
            .await
            .map_err(|err| self.convert_error(&err))?
            .error_for_status()
            .map_err(|err| self.convert_error(&err))?
            .json()
            .await
            .map_err(|err| FeatureQueryError::Parse {
                message: err.to_string(),
            })?;

        response.into_features()
    }
}
