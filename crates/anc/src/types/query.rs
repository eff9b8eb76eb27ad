//! Query request descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive date range.
///
/// Both ends are inclusive at day granularity; see
/// [`format_date_range`](crate::search::formatter::format_date_range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First included instant.
    pub start: DateTime<Utc>,
    /// Last included instant.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a new range.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// A date range applied to a named index field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFilter {
    /// Index field holding the date.
    pub field: String,
    /// The inclusive range.
    pub range: DateRange,
}

/// A request descriptor for the chunked executor.
///
/// An empty `patient_ids` sequence is not the same as `None`: the former means
/// "restricted to nobody" and yields an empty result without a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Free-text query.
    pub query: String,

    /// Engine sort expression.
    pub sort: Option<String>,

    /// Whether full documents are fetched with the rows.
    pub include_docs: bool,

    /// Maximum number of rows per engine call.
    pub limit: Option<u32>,

    /// Optional date restriction.
    pub date_range: Option<DateFilter>,

    /// Optional district restriction.
    pub district: Option<String>,

    /// Optional patient restriction.
    pub patient_ids: Option<Vec<String>>,
}

impl QueryOptions {
    /// Creates options for a free-text query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the sort expression.
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Sets the row limit.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requests full documents with the rows.
    pub fn include_docs(mut self) -> Self {
        self.include_docs = true;
        self
    }

    /// Restricts `field` to the inclusive `range`.
    pub fn with_date_range(mut self, field: impl Into<String>, range: DateRange) -> Self {
        self.date_range = Some(DateFilter {
            field: field.into(),
            range,
        });
        self
    }

    /// Restricts results to one district.
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    /// Restricts results to the given patients.
    pub fn with_patient_ids(mut self, patient_ids: Vec<String>) -> Self {
        self.patient_ids = Some(patient_ids);
        self
    }
}
