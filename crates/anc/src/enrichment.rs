//! Joins between entities and related reports.
//!
//! Entities are matched to visit and flag reports by patient identifier. The
//! operations annotate entities in place and never add, drop, or reorder them.

use std::collections::HashMap;

use crate::error::AncResult;
use crate::queries::{AncQueries, VisitQuery};
use crate::search::SearchEngine;
use crate::types::{PatientEntity, SearchResult, distinct_patient_ids};

/// Counts rows per patient identifier.
pub fn count_by_patient(result: &SearchResult) -> HashMap<&str, u32> {
    let mut counts = HashMap::new();
    for id in result.rows.iter().filter_map(|row| row.patient_id()) {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Sets every entity's visit count from `visits`, using 0 when none match.
pub fn apply_visit_counts<T: PatientEntity>(entities: &mut [T], visits: &SearchResult) {
    let counts = count_by_patient(visits);
    for entity in entities.iter_mut() {
        let count = entity
            .patient_id()
            .and_then(|id| counts.get(id).copied())
            .unwrap_or(0);
        entity.set_visits(count);
    }
}

/// Marks the first entity of each flagged patient as high risk.
pub fn apply_risk_flags<T: PatientEntity>(entities: &mut [T], flags: &SearchResult) {
    for id in flags.rows.iter().filter_map(|row| row.patient_id()) {
        if let Some(entity) = entities
            .iter_mut()
            .find(|entity| entity.patient_id() == Some(id))
        {
            entity.mark_high_risk();
        }
    }
}

impl<E: SearchEngine> AncQueries<E> {
    /// Annotates each entity with the number of visits for its patient.
    pub async fn inject_visits<T>(&self, entities: &mut [T]) -> AncResult<()>
    where
        T: PatientEntity + Send,
    {
        if entities.is_empty() {
            return Ok(());
        }

        let visits = self
            .visits(&VisitQuery {
                patient_ids: distinct_patient_ids(entities),
                ..Default::default()
            })
            .await?;
        apply_visit_counts(entities, &visits);
        Ok(())
    }

    /// Marks entities whose patient has a high-risk flag.
    ///
    /// Entities without a flag are left untouched.
    pub async fn inject_risk<T>(&self, entities: &mut [T]) -> AncResult<()>
    where
        T: PatientEntity + Send,
    {
        if entities.is_empty() {
            return Ok(());
        }

        let flags = self.high_risk(&distinct_patient_ids(entities)).await?;
        apply_risk_flags(entities, &flags);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PatientRecord, SearchRow};

    fn rows(patient_ids: &[&str]) -> SearchResult {
        SearchResult::from_rows(
            patient_ids
                .iter()
                .enumerate()
                .map(|(i, pid)| SearchRow::with_doc(PatientRecord::new(format!("r{i}"), *pid, "V")))
                .collect(),
        )
    }

    fn entities(patient_ids: &[&str]) -> Vec<PatientRecord> {
        patient_ids
            .iter()
            .enumerate()
            .map(|(i, pid)| PatientRecord::new(format!("e{i}"), *pid, "R"))
            .collect()
    }

    #[test]
    fn test_count_by_patient() {
        let binding = rows(&["a", "b", "a", "a"]);
        let counts = count_by_patient(&binding);
        assert_eq!(counts.get("a"), Some(&3));
        assert_eq!(counts.get("b"), Some(&1));
        assert_eq!(counts.get("c"), None);
    }

    #[test]
    fn test_apply_visit_counts_sets_every_entity() {
        let mut list = entities(&["a", "b", "c"]);
        list.push(PatientRecord::default());
        apply_visit_counts(&mut list, &rows(&["a", "c", "a"]));

        let visits: Vec<Option<u32>> = list.iter().map(|e| e.visits).collect();
        assert_eq!(visits, vec![Some(2), Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_apply_risk_flags_marks_first_match_only() {
        let mut list = entities(&["a", "b", "a"]);
        apply_risk_flags(&mut list, &rows(&["a"]));

        assert_eq!(list[0].high_risk, Some(true));
        assert_eq!(list[1].high_risk, None);
        assert_eq!(list[2].high_risk, None);
    }

    #[test]
    fn test_apply_risk_flags_never_clears() {
        let mut list = entities(&["a", "b"]);
        list[1].high_risk = Some(true);
        apply_risk_flags(&mut list, &SearchResult::empty());

        assert_eq!(list[0].high_risk, None);
        assert_eq!(list[1].high_risk, Some(true));
    }
}
