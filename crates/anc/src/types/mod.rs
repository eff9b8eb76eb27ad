//! Core types for queries, results, and clinical records.

mod query;
mod record;
mod result;

pub use query::{DateFilter, DateRange, QueryOptions};
pub use record::{PatientEntity, PatientRecord, distinct_patient_ids};
pub use result::{MergedResult, SearchResult, SearchRow};
