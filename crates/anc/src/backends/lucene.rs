//! HTTP transport to a couchdb-lucene style full-text endpoint.
//!
//! Requests are sent as `GET {url}/{database}/_fti/_design/{design_doc}/{index}`
//! with the query in the `q` parameter. The transport owns the request
//! timeout; nothing above it retries or cancels.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::AncConfig;
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::search::{EngineResponse, SearchEngine, SearchRequest};

const ENGINE_NAME: &str = "lucene";

/// Connection settings for [`LuceneEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuceneConfig {
    /// Base URL of the document store.
    pub url: String,

    /// Database holding the indexed records.
    pub database: String,

    /// Design document defining the index.
    pub design_doc: String,

    /// Index name.
    pub index: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for LuceneConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984".to_string(),
            database: "medic".to_string(),
            design_doc: "medic".to_string(),
            index: "data_records".to_string(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl TryFrom<&AncConfig> for LuceneConfig {
    type Error = ConfigError;

    fn try_from(config: &AncConfig) -> Result<Self, Self::Error> {
        let timeout = config.engine_timeout()?;
        Ok(Self {
            url: config.engine_url.clone(),
            database: config.engine_database.clone(),
            design_doc: config.engine_design_doc.clone(),
            index: config.engine_index.clone(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

/// Full-text engine reached over HTTP.
#[derive(Debug, Clone)]
pub struct LuceneEngine {
    client: reqwest::Client,
    config: LuceneConfig,
    endpoint: Url,
}

impl LuceneEngine {
    /// Creates an engine client. No connection is made until the first search.
    pub fn new(config: LuceneConfig) -> Result<Self, ConfigError> {
        let endpoint = build_endpoint(&config)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "engine".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LuceneConfig {
        &self.config
    }

    /// Returns the index endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the full URL for a request.
    pub fn request_url(&self, request: &SearchRequest) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &request.query);
            if let Some(sort) = &request.sort {
                pairs.append_pair("sort", sort);
            }
            if request.include_docs {
                pairs.append_pair("include_docs", "true");
            }
            if let Some(limit) = request.limit {
                pairs.append_pair("limit", &limit.to_string());
            }
        }
        url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout {
                timeout_ms: self.config.timeout_ms,
            }
        } else if err.is_connect() {
            EngineError::Unavailable {
                engine_name: ENGINE_NAME.to_string(),
                message: err.to_string(),
            }
        } else {
            EngineError::Internal {
                engine_name: ENGINE_NAME.to_string(),
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        }
    }
}

fn build_endpoint(config: &LuceneConfig) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        field: "engine_url".to_string(),
        message,
    };

    let mut url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("{} cannot be a base URL", config.url)))?
        .pop_if_empty()
        .extend([
            config.database.as_str(),
            "_fti",
            "_design",
            config.design_doc.as_str(),
            config.index.as_str(),
        ]);
    Ok(url)
}

#[async_trait]
impl SearchEngine for LuceneEngine {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    async fn search(&self, request: &SearchRequest) -> EngineResult<Option<EngineResponse>> {
        let url = self.request_url(request);
        tracing::debug!(query = %request.query, "Sending full-text search");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Full-text search failed");
            return Err(EngineError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Ok(serde_json::from_slice::<Option<EngineResponse>>(&bytes)?)
    }
}
