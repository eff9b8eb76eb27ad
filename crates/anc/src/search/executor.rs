//! Chunked query execution.
//!
//! The engine limits how many boolean clauses one query may contain. A query
//! restricted to a long list of patients is therefore split into chunks of at
//! most `max_clauses` identifiers, executed one after another, and folded into
//! a single [`SearchResult`] in chunk order.

use tracing::debug;

use crate::config::DEFAULT_MAX_CLAUSES;
use crate::error::AncResult;
use crate::types::{QueryOptions, SearchResult};

use super::engine::{SearchEngine, SearchRequest};
use super::formatter::{and_all, district_clause, format_date_filter, patient_clause};

/// Executes queries against a [`SearchEngine`], chunking patient filters.
#[derive(Debug, Clone)]
pub struct ChunkedQueryExecutor<E> {
    engine: E,
    max_clauses: usize,
}

impl<E: SearchEngine> ChunkedQueryExecutor<E> {
    /// Creates an executor with the default clause limit.
    pub fn new(engine: E) -> Self {
        Self::with_max_clauses(engine, DEFAULT_MAX_CLAUSES)
    }

    /// Creates an executor with a custom clause limit (minimum 1).
    pub fn with_max_clauses(engine: E, max_clauses: usize) -> Self {
        Self {
            engine,
            max_clauses: max_clauses.max(1),
        }
    }

    /// Returns the clause limit.
    pub fn max_clauses(&self) -> usize {
        self.max_clauses
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Executes `options`, splitting any patient filter into chunks.
    ///
    /// An empty patient filter returns an empty result without calling the
    /// engine. The first failing chunk aborts the sequence and its error is
    /// returned unchanged.
    pub async fn execute(&self, options: &QueryOptions) -> AncResult<SearchResult> {
        let base = base_query(options);

        let Some(patient_ids) = options.patient_ids.as_deref() else {
            return self.run(options, base).await;
        };

        if patient_ids.is_empty() {
            debug!(engine = self.engine.name(), "Empty patient filter, skipping search");
            return Ok(SearchResult::empty());
        }

        let chunk_count = patient_ids.len().div_ceil(self.max_clauses);
        debug!(
            engine = self.engine.name(),
            patients = patient_ids.len(),
            chunks = chunk_count,
            max_clauses = self.max_clauses,
            "Executing chunked search"
        );

        let mut merged = SearchResult::empty();
        for (index, chunk) in patient_ids.chunks(self.max_clauses).enumerate() {
            let query = and_all(&[base.as_str(), patient_clause(chunk).as_str()]);
            let result = self.run(options, query).await?;
            debug!(
                chunk = index,
                size = chunk.len(),
                rows = result.rows.len(),
                total_rows = result.total_rows,
                "Chunk complete"
            );
            merged.merge(result);
        }

        Ok(merged)
    }

    async fn run(&self, options: &QueryOptions, query: String) -> AncResult<SearchResult> {
        let request = SearchRequest {
            query,
            sort: options.sort.clone(),
            include_docs: options.include_docs,
            limit: options.limit,
        };
        let response = self.engine.search(&request).await?;
        Ok(SearchResult::from(response))
    }
}

/// Builds the query text shared by every chunk.
fn base_query(options: &QueryOptions) -> String {
    let mut fragments = vec![options.query.clone()];
    if let Some(filter) = &options.date_range {
        fragments.push(format_date_filter(filter));
    }
    if let Some(district) = &options.district {
        fragments.push(district_clause(district));
    }
    and_all(&fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DateRange;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_base_query_includes_filters() {
        let range = DateRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap(),
        );
        let options = QueryOptions::new("form:(\"D\")")
            .with_date_range("reported_date", range)
            .with_district("d9");
        assert_eq!(
            base_query(&options),
            "form:(\"D\") AND reported_date<date>:[2024-01-01 TO 2024-01-08] AND district:\"d9\""
        );
    }

    #[test]
    fn test_base_query_plain() {
        assert_eq!(base_query(&QueryOptions::new("errors<int>:0")), "errors<int>:0");
    }
}
