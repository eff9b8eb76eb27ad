//! Query fragment builders for the full-text engine.
//!
//! Fragments use the Lucene query syntax with typed fields (`field<date>`,
//! `field<int>`) as understood by couchdb-lucene style indexes.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::types::DateFilter;

/// Index field holding the form-type code.
pub const FORM_FIELD: &str = "form";

/// Index field holding the patient identifier.
pub const PATIENT_ID_FIELD: &str = "patient_id";

/// Index field holding the district identifier.
pub const DISTRICT_FIELD: &str = "district";

/// Restricts results to records without validation errors.
pub const NO_ERRORS_CLAUSE: &str = "errors<int>:0";

/// Normalizes an instant to its UTC calendar day.
pub fn utc_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Utc).date_naive()
}

fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Builds a range fragment covering `start` through `end` inclusive.
///
/// The engine treats the upper bound as exclusive, so the fragment ends on the
/// day after `end`. Both bounds are reduced to UTC days first.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use helios_anc::search::formatter::format_date_range;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap();
/// assert_eq!(
///     format_date_range("reported_date", &start, &end),
///     "reported_date<date>:[2024-01-01 TO 2024-02-01]"
/// );
/// ```
pub fn format_date_range<Tz: TimeZone>(
    field: &str,
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> String {
    let lower = utc_day(start);
    let upper = utc_day(end) + Duration::days(1);
    format!(
        "{}<date>:[{} TO {}]",
        field,
        format_day(lower),
        format_day(upper)
    )
}

/// Builds the range fragment for a [`DateFilter`].
pub fn format_date_filter(filter: &DateFilter) -> String {
    format_date_range(&filter.field, &filter.range.start, &filter.range.end)
}

/// Builds a fragment matching any of the given form codes.
pub fn form_clause<S: AsRef<str>>(codes: &[S]) -> String {
    let quoted: Vec<String> = codes
        .iter()
        .map(|code| format!("\"{}\"", code.as_ref()))
        .collect();
    format!("{}:({})", FORM_FIELD, quoted.join(" OR "))
}

/// Builds a fragment matching one district.
pub fn district_clause(district: &str) -> String {
    format!("{}:\"{}\"", DISTRICT_FIELD, district)
}

/// Builds a fragment matching any of the given patient identifiers.
///
/// Each identifier counts as one boolean clause against the engine limit.
pub fn patient_clause<S: AsRef<str>>(patient_ids: &[S]) -> String {
    let ids: Vec<&str> = patient_ids.iter().map(AsRef::as_ref).collect();
    format!("{}:({})", PATIENT_ID_FIELD, ids.join(" OR "))
}

/// Joins non-empty fragments with `AND`.
pub fn and_all<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(AsRef::as_ref)
        .filter(|f| !f.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" AND ")
}
