//! Named antenatal queries.
//!
//! Each query fixes the form codes and date semantics for one kind of clinical
//! report and delegates execution to the [`ChunkedQueryExecutor`]. All queries
//! request full documents, since callers and the enrichment operations read
//! patient identifiers and dates from them. Every engine call carries the
//! configured row limit; without one the engine returns only its default page.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::config::{AncConfig, FormCodeMap, FormKind};
use crate::error::{AncResult, ConfigError};
use crate::search::formatter::{NO_ERRORS_CLAUSE, and_all, form_clause};
use crate::search::{ChunkedQueryExecutor, SearchEngine};
use crate::types::{DateRange, PatientEntity, QueryOptions, SearchResult, distinct_patient_ids};

/// Index field the registration window applies to.
pub const EXPECTED_DATE_FIELD: &str = "expected_date";

/// Index field holding the report date.
pub const REPORTED_DATE_FIELD: &str = "reported_date";

/// Business-rule settings for the named queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Default lower window offset for registrations, in weeks.
    pub min_weeks_pregnant: u32,
    /// Default upper window offset for registrations, in weeks.
    pub max_weeks_pregnant: u32,
    /// Minimum weeks pregnant used when collecting birth-eligible patients.
    pub birth_min_weeks_pregnant: u32,
    /// Oldest registration, in weeks, still considered birth-eligible.
    pub birth_max_weeks_pregnant: u32,
    /// Days past now that open-ended visit ranges still include.
    pub visit_lookahead_days: u32,
    /// Maximum rows per engine call.
    pub query_limit: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            min_weeks_pregnant: 0,
            max_weeks_pregnant: 42,
            birth_min_weeks_pregnant: 42,
            birth_max_weeks_pregnant: 104,
            visit_lookahead_days: 2,
            query_limit: 10_000,
        }
    }
}

impl From<&AncConfig> for QuerySettings {
    fn from(config: &AncConfig) -> Self {
        Self {
            min_weeks_pregnant: config.min_weeks_pregnant,
            max_weeks_pregnant: config.max_weeks_pregnant,
            birth_min_weeks_pregnant: config.birth_min_weeks_pregnant,
            birth_max_weeks_pregnant: config.birth_max_weeks_pregnant,
            visit_lookahead_days: config.visit_lookahead_days,
            query_limit: config.query_limit,
        }
    }
}

/// Parameters for [`AncQueries::registrations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationQuery {
    /// Explicit expected-date range; replaces the sliding window.
    pub date_range: Option<DateRange>,
    /// Overrides the default lower window offset.
    pub min_weeks_pregnant: Option<u32>,
    /// Overrides the default upper window offset.
    pub max_weeks_pregnant: Option<u32>,
    /// Restricts results to one district.
    pub district: Option<String>,
    /// Restricts results to the given patients.
    pub patient_ids: Option<Vec<String>>,
}

/// Parameters for [`AncQueries::deliveries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryQuery {
    /// Restricts the reported date.
    pub date_range: Option<DateRange>,
    /// Restricts results to one district.
    pub district: Option<String>,
    /// Restricts results to the given patients.
    pub patient_ids: Option<Vec<String>>,
}

/// Parameters for [`AncQueries::visits`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitQuery {
    /// Patients whose visits are wanted. Visits are never listed unfiltered.
    pub patient_ids: Vec<String>,
    /// Earliest reported date.
    pub start: Option<DateTime<Utc>>,
    /// Latest reported date; defaults to a few days past now.
    pub end: Option<DateTime<Utc>>,
}

/// The antenatal query library.
pub struct AncQueries<E> {
    executor: ChunkedQueryExecutor<E>,
    forms: FormCodeMap,
    clock: Arc<dyn Clock>,
    settings: QuerySettings,
}

impl<E> std::fmt::Debug for AncQueries<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AncQueries")
            .field("forms", &self.forms)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<E: SearchEngine> AncQueries<E> {
    /// Creates a query library with default settings.
    pub fn new(
        executor: ChunkedQueryExecutor<E>,
        forms: FormCodeMap,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            executor,
            forms,
            clock,
            settings: QuerySettings::default(),
        }
    }

    /// Creates a query library from resolved configuration.
    pub fn from_config(
        engine: E,
        config: &AncConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let forms = config.form_codes()?;
        let executor = ChunkedQueryExecutor::with_max_clauses(engine, config.max_clauses);
        Ok(Self::new(executor, forms, clock).with_settings(QuerySettings::from(config)))
    }

    /// Replaces the business-rule settings.
    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the form-code table.
    pub fn forms(&self) -> &FormCodeMap {
        &self.forms
    }

    /// Returns the settings.
    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Returns the executor.
    pub fn executor(&self) -> &ChunkedQueryExecutor<E> {
        &self.executor
    }

    /// Returns the clock.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn form_query(&self, kinds: &[FormKind]) -> String {
        let codes: Vec<&str> = kinds.iter().map(|kind| self.forms.code(*kind)).collect();
        form_clause(&codes)
    }

    /// Options shared by every named query: full documents and the row limit.
    fn options(&self, query: String) -> QueryOptions {
        QueryOptions::new(query)
            .include_docs()
            .with_limit(self.settings.query_limit)
    }

    /// Valid registrations (report- or LMP-dated) within an expected-date window.
    ///
    /// Without an explicit range the window is
    /// `[now - max_weeks_pregnant, now - min_weeks_pregnant]`.
    pub async fn registrations(&self, query: &RegistrationQuery) -> AncResult<SearchResult> {
        let range = match query.date_range {
            Some(range) => range,
            None => {
                let now = self.clock.now();
                let max = query
                    .max_weeks_pregnant
                    .unwrap_or(self.settings.max_weeks_pregnant);
                let min = query
                    .min_weeks_pregnant
                    .unwrap_or(self.settings.min_weeks_pregnant);
                DateRange::new(
                    now - Duration::weeks(i64::from(max)),
                    now - Duration::weeks(i64::from(min)),
                )
            }
        };

        let text = and_all(&[
            NO_ERRORS_CLAUSE.to_string(),
            self.form_query(&[FormKind::Registration, FormKind::RegistrationLmp]),
        ]);
        let mut options = self
            .options(text)
            .with_date_range(EXPECTED_DATE_FIELD, range);
        options.district = query.district.clone();
        options.patient_ids = query.patient_ids.clone();

        self.executor.execute(&options).await
    }

    /// Delivery reports.
    pub async fn deliveries(&self, query: &DeliveryQuery) -> AncResult<SearchResult> {
        let mut options = self.options(self.form_query(&[FormKind::Delivery]));
        if let Some(range) = query.date_range {
            options = options.with_date_range(REPORTED_DATE_FIELD, range);
        }
        options.district = query.district.clone();
        options.patient_ids = query.patient_ids.clone();

        self.executor.execute(&options).await
    }

    /// Every delivery report, unfiltered.
    pub async fn all_deliveries(&self) -> AncResult<SearchResult> {
        self.deliveries(&DeliveryQuery::default()).await
    }

    /// Visit reports for the given patients.
    ///
    /// With a start date, the reported date is restricted to `[start, end]`,
    /// where a missing end means `visit_lookahead_days` past now.
    pub async fn visits(&self, query: &VisitQuery) -> AncResult<SearchResult> {
        if query.patient_ids.is_empty() {
            return Ok(SearchResult::empty());
        }

        let mut options = self
            .options(self.form_query(&[FormKind::Visit]))
            .with_patient_ids(query.patient_ids.clone());
        if let Some(start) = query.start {
            let end = query.end.unwrap_or_else(|| {
                self.clock.now() + Duration::days(i64::from(self.settings.visit_lookahead_days))
            });
            options = options.with_date_range(REPORTED_DATE_FIELD, DateRange::new(start, end));
        }

        self.executor.execute(&options).await
    }

    /// High-risk flag reports for the given patients.
    pub async fn high_risk(&self, patient_ids: &[String]) -> AncResult<SearchResult> {
        if patient_ids.is_empty() {
            return Ok(SearchResult::empty());
        }

        let options = self
            .options(self.form_query(&[FormKind::Flag]))
            .with_patient_ids(patient_ids.to_vec());

        self.executor.execute(&options).await
    }

    /// Patients who are at term or overdue, or who have delivered.
    ///
    /// Union of the patients in registrations between `birth_min_weeks_pregnant`
    /// and `birth_max_weeks_pregnant` old and in all deliveries, deduplicated in
    /// first-seen order. The queries run in sequence and the first failure is
    /// returned.
    pub async fn birth_patient_ids(&self) -> AncResult<Vec<String>> {
        let registrations = self
            .registrations(&RegistrationQuery {
                min_weeks_pregnant: Some(self.settings.birth_min_weeks_pregnant),
                max_weeks_pregnant: Some(self.settings.birth_max_weeks_pregnant),
                ..Default::default()
            })
            .await?;
        let deliveries = self.all_deliveries().await?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = registrations
            .patient_ids()
            .into_iter()
            .chain(deliveries.patient_ids())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        debug!(patients = ids.len(), "Collected birth-eligible patients");
        Ok(ids)
    }

    /// Removes entities whose patient already has a delivery report.
    ///
    /// Deliveries are looked up for exactly the patients in `entities` on every
    /// call. Relative order of the remaining entities is kept.
    pub async fn reject_delivered<T>(&self, entities: Vec<T>) -> AncResult<Vec<T>>
    where
        T: PatientEntity + Send,
    {
        if entities.is_empty() {
            return Ok(entities);
        }

        let deliveries = self
            .deliveries(&DeliveryQuery {
                patient_ids: Some(distinct_patient_ids(&entities)),
                ..Default::default()
            })
            .await?;
        let delivered: HashSet<String> = deliveries.patient_ids().into_iter().collect();

        Ok(entities
            .into_iter()
            .filter(|entity| {
                entity
                    .patient_id()
                    .is_none_or(|id| !delivered.contains(id))
            })
            .collect())
    }
}
