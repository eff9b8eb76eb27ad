//! Test infrastructure for the query layer.
//!
//! [`MockEngine`] answers queries from an in-memory set of records. It records
//! every request so tests can assert on query text and chunking, and it can be
//! told to fail a specific call.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use helios_anc::clock::{Clock, FixedClock};
use helios_anc::config::FormCodeMap;
use helios_anc::error::{EngineError, EngineResult};
use helios_anc::search::{ChunkedQueryExecutor, EngineResponse, SearchEngine, SearchRequest};
use helios_anc::types::{PatientRecord, SearchRow};
use helios_anc::AncQueries;

/// In-memory engine used by the integration tests.
#[derive(Debug, Default)]
pub struct MockEngine {
    records: Vec<PatientRecord>,
    requests: Mutex<Vec<SearchRequest>>,
    fail_on_call: Option<usize>,
    answer_null: bool,
}

impl MockEngine {
    pub fn new(records: Vec<PatientRecord>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Fails the `n`th call (1-based) with an unavailable error.
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    /// Answers every request without a body.
    pub fn answering_null(mut self) -> Self {
        self.answer_null = true;
        self
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn matches(&self, record: &PatientRecord, query: &str) -> bool {
        if let Some(forms) = clause_values(query, "form:(") {
            if !record.form.as_deref().is_some_and(|f| forms.contains(&f)) {
                return false;
            }
        }
        if let Some(ids) = clause_values(query, "patient_id:(") {
            if !record.patient_id.as_deref().is_some_and(|p| ids.contains(&p)) {
                return false;
            }
        }
        true
    }
}

/// Extracts the `OR`-separated values of a parenthesized clause.
fn clause_values<'a>(query: &'a str, prefix: &str) -> Option<Vec<&'a str>> {
    let start = query.find(prefix)? + prefix.len();
    let end = start + query[start..].find(')')?;
    Some(
        query[start..end]
            .split(" OR ")
            .map(|v| v.trim().trim_matches('"'))
            .collect(),
    )
}

#[async_trait]
impl SearchEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, request: &SearchRequest) -> EngineResult<Option<EngineResponse>> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(request.clone());
            requests.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(EngineError::Unavailable {
                engine_name: "mock".to_string(),
                message: format!("call {call} refused"),
            });
        }
        if self.answer_null {
            return Ok(None);
        }

        let rows: Vec<SearchRow> = self
            .records
            .iter()
            .filter(|record| self.matches(record, &request.query))
            .cloned()
            .map(SearchRow::with_doc)
            .collect();

        Ok(Some(EngineResponse {
            total_rows: Some(rows.len() as u64),
            rows: Some(rows),
        }))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
}

pub fn registration(id: &str, patient_id: &str) -> PatientRecord {
    PatientRecord::new(id, patient_id, "R").with_reported_date(now())
}

pub fn delivery(id: &str, patient_id: &str) -> PatientRecord {
    PatientRecord::new(id, patient_id, "D").with_reported_date(now())
}

pub fn visit(id: &str, patient_id: &str) -> PatientRecord {
    PatientRecord::new(id, patient_id, "V").with_reported_date(now())
}

pub fn flag(id: &str, patient_id: &str) -> PatientRecord {
    PatientRecord::new(id, patient_id, "F").with_reported_date(now())
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Builds a query library over `engine` with a fixed clock at [`now`].
pub fn queries(engine: Arc<MockEngine>, max_clauses: usize) -> AncQueries<Arc<MockEngine>> {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now()));
    AncQueries::new(
        ChunkedQueryExecutor::with_max_clauses(engine, max_clauses),
        FormCodeMap::default(),
        clock,
    )
}
