//! Search result types and chunk merging.

use serde::{Deserialize, Serialize};

use super::record::PatientRecord;

/// One matching document reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRow {
    /// Document reference.
    pub id: String,

    /// The fetched document, when documents were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<PatientRecord>,
}

impl SearchRow {
    /// Creates a row with a fetched document.
    pub fn with_doc(doc: PatientRecord) -> Self {
        Self {
            id: doc.id.clone(),
            doc: Some(doc),
        }
    }

    /// Returns the patient identifier of the fetched document.
    pub fn patient_id(&self) -> Option<&str> {
        self.doc.as_ref().and_then(|doc| doc.patient_id.as_deref())
    }
}

/// A logical search result.
///
/// `total_rows` counts every match, independent of how many rows were
/// returned. The same type accumulates chunk results: see [`SearchResult::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matches.
    pub total_rows: u64,

    /// Returned rows, in engine order.
    pub rows: Vec<SearchRow>,
}

/// Accumulator for folding chunk results into one logical result.
pub type MergedResult = SearchResult;

impl SearchResult {
    /// Creates an empty result.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a result from rows, with `total_rows` equal to the row count.
    pub fn from_rows(rows: Vec<SearchRow>) -> Self {
        Self {
            total_rows: rows.len() as u64,
            rows,
        }
    }

    /// Returns `true` if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Folds `other` into this result.
    ///
    /// Rows are appended after the existing rows and totals are summed, so
    /// merging is associative.
    pub fn merge(&mut self, other: SearchResult) {
        self.total_rows += other.total_rows;
        self.rows.extend(other.rows);
    }

    /// Consuming form of [`SearchResult::merge`].
    pub fn merged(mut self, other: SearchResult) -> Self {
        self.merge(other);
        self
    }

    /// Iterates over the fetched documents.
    pub fn documents(&self) -> impl Iterator<Item = &PatientRecord> {
        self.rows.iter().filter_map(|row| row.doc.as_ref())
    }

    /// Patient identifiers of the fetched documents, in row order.
    pub fn patient_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(SearchRow::patient_id)
            .map(str::to_string)
            .collect()
    }
}
