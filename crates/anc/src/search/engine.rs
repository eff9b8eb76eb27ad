//! Boundary contract toward the full-text search engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::types::{SearchResult, SearchRow};

/// A single request sent to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Complete query text.
    pub query: String,

    /// Engine sort expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,

    /// Whether full documents are returned inline.
    pub include_docs: bool,

    /// Maximum number of rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// The engine's answer, exactly as received.
///
/// Either field may be missing; [`SearchResult::from`] substitutes zero and an
/// empty row sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    /// Total number of matches.
    #[serde(default)]
    pub total_rows: Option<u64>,

    /// Returned rows.
    #[serde(default)]
    pub rows: Option<Vec<SearchRow>>,
}

impl From<Option<EngineResponse>> for SearchResult {
    fn from(response: Option<EngineResponse>) -> Self {
        match response {
            Some(response) => SearchResult {
                total_rows: response.total_rows.unwrap_or(0),
                rows: response.rows.unwrap_or_default(),
            },
            None => SearchResult::empty(),
        }
    }
}

/// A full-text search engine.
///
/// Implementations perform one request per call and report transport or index
/// failures as errors. An engine that answers without a body returns `Ok(None)`.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Returns a short name for diagnostics.
    fn name(&self) -> &str;

    /// Executes one search request.
    async fn search(&self, request: &SearchRequest) -> EngineResult<Option<EngineResponse>>;
}

#[async_trait]
impl<E: SearchEngine + ?Sized> SearchEngine for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn search(&self, request: &SearchRequest) -> EngineResult<Option<EngineResponse>> {
        (**self).search(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PatientRecord;

    #[test]
    fn test_absent_response_becomes_empty_result() {
        let result = SearchResult::from(None);
        assert_eq!(result.total_rows, 0);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_missing_rows_become_empty_sequence() {
        let response: EngineResponse = serde_json::from_str(r#"{"total_rows": 12}"#).unwrap();
        let result = SearchResult::from(Some(response));
        assert_eq!(result.total_rows, 12);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_missing_total_becomes_zero() {
        let response = EngineResponse {
            total_rows: None,
            rows: Some(vec![SearchRow::with_doc(PatientRecord::new("a", "1", "V"))]),
        };
        let result = SearchResult::from(Some(response));
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_request_serialization_omits_unset_fields() {
        let request = SearchRequest {
            query: "form:(\"V\")".to_string(),
            include_docs: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("sort").is_none());
        assert!(value.get("limit").is_none());
        assert_eq!(value["include_docs"], serde_json::json!(true));
    }
}
