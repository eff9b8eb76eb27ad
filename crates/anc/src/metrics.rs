//! Gestational age and due-date estimates.
//!
//! Registrations come in two kinds. Report-dated registrations only know when
//! they were received, so estimates based on them are approximate. LMP-dated
//! registrations carry the last menstrual period and give exact estimates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::{FormCodeMap, FormKind};
use crate::types::PatientRecord;

/// Weeks from LMP to conception, subtracted from LMP-based ages.
pub const LMP_OFFSET_WEEKS: i64 = 2;

/// Gestation assumed for report-dated registrations, in weeks.
pub const REPORTED_TERM_WEEKS: i64 = 40;

/// Gestation from LMP used for due dates, in weeks.
pub const LMP_TERM_WEEKS: i64 = 42;

/// Estimated weeks of pregnancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeksPregnant {
    /// Whole weeks.
    pub number: i64,
    /// Whether the estimate is based on the report date.
    pub approximate: bool,
}

/// Estimated due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDate {
    /// The estimated date.
    pub date: DateTime<Utc>,
    /// Whether the estimate is based on the report date.
    pub approximate: bool,
}

/// Returns `true` if the record is a report-dated registration.
pub fn is_report_dated(record: &PatientRecord, forms: &FormCodeMap) -> bool {
    record.form.as_deref() == Some(forms.code(FormKind::Registration))
}

/// Estimates weeks pregnant at `now`.
///
/// Returns `None` when the date the estimate depends on is missing.
pub fn weeks_pregnant(
    record: &PatientRecord,
    forms: &FormCodeMap,
    now: DateTime<Utc>,
) -> Option<WeeksPregnant> {
    if is_report_dated(record, forms) {
        let reported = record.reported_date?;
        Some(WeeksPregnant {
            number: (now - reported).num_weeks(),
            approximate: true,
        })
    } else {
        let lmp = record.lmp_date?;
        Some(WeeksPregnant {
            number: (now - lmp).num_weeks() - LMP_OFFSET_WEEKS,
            approximate: false,
        })
    }
}

/// [`weeks_pregnant`] at the clock's current instant.
pub fn weeks_pregnant_now(
    record: &PatientRecord,
    forms: &FormCodeMap,
    clock: &dyn Clock,
) -> Option<WeeksPregnant> {
    weeks_pregnant(record, forms, clock.now())
}

/// Estimates the due date.
///
/// Returns `None` when the date the estimate depends on is missing.
pub fn estimated_due_date(record: &PatientRecord, forms: &FormCodeMap) -> Option<DueDate> {
    if is_report_dated(record, forms) {
        let reported = record.reported_date?;
        Some(DueDate {
            date: reported + Duration::weeks(REPORTED_TERM_WEEKS),
            approximate: true,
        })
    } else {
        let lmp = record.lmp_date?;
        Some(DueDate {
            date: lmp + Duration::weeks(LMP_TERM_WEEKS),
            approximate: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_lmp_weeks_subtract_offset() {
        let forms = FormCodeMap::default();
        let record = PatientRecord::new("a", "1", "P").with_lmp_date(now() - Duration::weeks(10));
        assert_eq!(
            weeks_pregnant(&record, &forms, now()),
            Some(WeeksPregnant {
                number: 8,
                approximate: false
            })
        );
    }

    #[test]
    fn test_reported_weeks_are_approximate() {
        let forms = FormCodeMap::default();
        let record =
            PatientRecord::new("a", "1", "R").with_reported_date(now() - Duration::weeks(6));
        assert_eq!(
            weeks_pregnant(&record, &forms, now()),
            Some(WeeksPregnant {
                number: 6,
                approximate: true
            })
        );
    }

    #[test]
    fn test_partial_weeks_are_truncated() {
        let forms = FormCodeMap::default();
        let record = PatientRecord::new("a", "1", "R")
            .with_reported_date(now() - Duration::weeks(3) - Duration::days(6));
        assert_eq!(weeks_pregnant(&record, &forms, now()).unwrap().number, 3);
    }

    #[test]
    fn test_lmp_due_date() {
        let forms = FormCodeMap::default();
        let lmp = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let record = PatientRecord::new("a", "1", "P").with_lmp_date(lmp);
        let due = estimated_due_date(&record, &forms).unwrap();
        assert_eq!(due.date, Utc.with_ymd_and_hms(2020, 10, 21, 0, 0, 0).unwrap());
        assert!(!due.approximate);
    }

    #[test]
    fn test_reported_due_date() {
        let forms = FormCodeMap::default();
        let reported = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let record = PatientRecord::new("a", "1", "R").with_reported_date(reported);
        let due = estimated_due_date(&record, &forms).unwrap();
        assert_eq!(due.date, Utc.with_ymd_and_hms(2020, 10, 7, 0, 0, 0).unwrap());
        assert!(due.approximate);
    }

    #[test]
    fn test_missing_dates_give_none() {
        let forms = FormCodeMap::default();
        let record = PatientRecord::new("a", "1", "P");
        assert_eq!(weeks_pregnant(&record, &forms, now()), None);
        assert_eq!(estimated_due_date(&record, &forms), None);
    }
}
