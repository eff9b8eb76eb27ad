//! Clinical record documents returned by the full-text engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A clinical report document.
///
/// Dates are stored as epoch milliseconds, matching the document store. Fields
/// this layer does not interpret are kept in `fields` so a record can be passed
/// back to callers without loss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Document identifier.
    #[serde(rename = "_id", default)]
    pub id: String,

    /// Patient the report is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,

    /// External form-type code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,

    /// When the report was received.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub reported_date: Option<DateTime<Utc>>,

    /// Last menstrual period, for LMP-based registrations.
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub lmp_date: Option<DateTime<Utc>>,

    /// Number of antenatal visits, once annotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visits: Option<u32>,

    /// Set to `true` once a high-risk flag has been found for the patient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_risk: Option<bool>,

    /// Remaining document fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PatientRecord {
    /// Creates a record for a patient with the given form code.
    pub fn new(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        form: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            patient_id: Some(patient_id.into()),
            form: Some(form.into()),
            ..Default::default()
        }
    }

    /// Sets the reported date.
    pub fn with_reported_date(mut self, reported_date: DateTime<Utc>) -> Self {
        self.reported_date = Some(reported_date);
        self
    }

    /// Sets the last menstrual period date.
    pub fn with_lmp_date(mut self, lmp_date: DateTime<Utc>) -> Self {
        self.lmp_date = Some(lmp_date);
        self
    }
}

/// An entity that can be joined to related records by patient identifier.
///
/// The enrichment operations only read the identifier and write the derived
/// attributes; they never add, remove, or reorder entities.
pub trait PatientEntity {
    /// Returns the patient identifier, if the entity carries one.
    fn patient_id(&self) -> Option<&str>;

    /// Records the number of visits found for the patient.
    fn set_visits(&mut self, visits: u32);

    /// Marks the entity as high risk.
    fn mark_high_risk(&mut self);
}

impl PatientEntity for PatientRecord {
    fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    fn set_visits(&mut self, visits: u32) {
        self.visits = Some(visits);
    }

    fn mark_high_risk(&mut self) {
        self.high_risk = Some(true);
    }
}

/// Collects the distinct patient identifiers of `entities`, in first-seen order.
pub fn distinct_patient_ids<T: PatientEntity>(entities: &[T]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    entities
        .iter()
        .filter_map(PatientEntity::patient_id)
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
