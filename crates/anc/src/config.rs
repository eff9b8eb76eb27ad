//! Configuration for the antenatal query layer.
//!
//! Configuration is resolved once at process startup and passed into the
//! executor and query library explicitly. Nothing here is read again while a
//! request is being served.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ANC_MAX_CLAUSES` | 1000 | Max boolean clauses per engine query |
//! | `ANC_MIN_WEEKS_PREGNANT` | 0 | Registration window lower offset (weeks) |
//! | `ANC_MAX_WEEKS_PREGNANT` | 42 | Registration window upper offset (weeks) |
//! | `ANC_BIRTH_MIN_WEEKS_PREGNANT` | 42 | Min weeks for birth-eligible patients |
//! | `ANC_BIRTH_MAX_WEEKS_PREGNANT` | 104 | Max weeks for birth-eligible patients |
//! | `ANC_QUERY_LIMIT` | 10000 | Max rows per engine call for named queries |
//! | `ANC_VISIT_LOOKAHEAD_DAYS` | 2 | Default visit range end offset (days) |
//! | `ANC_FORM_REGISTRATION` | R | Registration form code |
//! | `ANC_FORM_REGISTRATION_LMP` | P | Registration-by-LMP form code |
//! | `ANC_FORM_DELIVERY` | D | Delivery form code |
//! | `ANC_FORM_VISIT` | V | Visit form code |
//! | `ANC_FORM_FLAG` | F | High-risk flag form code |
//! | `ANC_ENGINE_URL` | http://localhost:5984 | Full-text endpoint base URL |
//! | `ANC_ENGINE_DATABASE` | medic | Database name |
//! | `ANC_ENGINE_DESIGN_DOC` | medic | Design document holding the index |
//! | `ANC_ENGINE_INDEX` | data_records | Index name |
//! | `ANC_ENGINE_TIMEOUT` | 30s | Transport timeout |
//! | `ANC_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use helios_anc::config::{AncConfig, FormKind};
//!
//! let config = AncConfig::default();
//! let forms = config.form_codes().unwrap();
//! assert_eq!(forms.code(FormKind::Delivery), "D");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use clap::{Args, Parser};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default maximum number of boolean conditions in one engine query.
pub const DEFAULT_MAX_CLAUSES: usize = 1000;

/// Logical clinical form kinds the query library filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    /// Registration dated from the report itself.
    Registration,
    /// Registration dated from the last menstrual period.
    RegistrationLmp,
    /// Delivery report.
    Delivery,
    /// Antenatal visit.
    Visit,
    /// High-risk flag.
    Flag,
}

impl FormKind {
    /// Every form kind, in a stable order.
    pub const ALL: [FormKind; 5] = [
        FormKind::Registration,
        FormKind::RegistrationLmp,
        FormKind::Delivery,
        FormKind::Visit,
        FormKind::Flag,
    ];

    /// Returns the logical name of the form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Registration => "registration",
            FormKind::RegistrationLmp => "registration_lmp",
            FormKind::Delivery => "delivery",
            FormKind::Visit => "visit",
            FormKind::Flag => "flag",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable mapping from logical form kinds to external form-type codes.
///
/// A map can only be built when every [`FormKind`] has a non-blank code, so
/// [`FormCodeMap::code`] never fails once construction has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormCodeMap {
    codes: HashMap<FormKind, String>,
}

impl FormCodeMap {
    /// Builds a map, rejecting missing or blank codes.
    pub fn new(codes: HashMap<FormKind, String>) -> Result<Self, ConfigError> {
        for kind in FormKind::ALL {
            match codes.get(&kind) {
                None => {
                    return Err(ConfigError::MissingFormCode {
                        form: kind.to_string(),
                    });
                }
                Some(code) if code.trim().is_empty() => {
                    return Err(ConfigError::EmptyFormCode {
                        form: kind.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(Self { codes })
    }

    /// Returns the external code for a form kind.
    pub fn code(&self, kind: FormKind) -> &str {
        // Presence of every kind is checked in `new`.
        self.codes.get(&kind).map(String::as_str).unwrap_or_default()
    }

    /// Returns the form kind a code belongs to, if any.
    pub fn kind_of(&self, code: &str) -> Option<FormKind> {
        FormKind::ALL
            .into_iter()
            .find(|kind| self.code(*kind) == code)
    }
}

impl Default for FormCodeMap {
    fn default() -> Self {
        Self {
            codes: FormCodeConfig::default().codes(),
        }
    }
}

/// Form codes as they appear in configuration.
#[derive(Debug, Clone, Args, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormCodeConfig {
    /// Registration form code.
    #[arg(long = "form-registration", env = "ANC_FORM_REGISTRATION", default_value = "R")]
    #[serde(default = "default_registration_code")]
    pub registration: String,

    /// Registration-by-LMP form code.
    #[arg(
        long = "form-registration-lmp",
        env = "ANC_FORM_REGISTRATION_LMP",
        default_value = "P"
    )]
    #[serde(default = "default_registration_lmp_code")]
    pub registration_lmp: String,

    /// Delivery form code.
    #[arg(long = "form-delivery", env = "ANC_FORM_DELIVERY", default_value = "D")]
    #[serde(default = "default_delivery_code")]
    pub delivery: String,

    /// Visit form code.
    #[arg(long = "form-visit", env = "ANC_FORM_VISIT", default_value = "V")]
    #[serde(default = "default_visit_code")]
    pub visit: String,

    /// High-risk flag form code.
    #[arg(long = "form-flag", env = "ANC_FORM_FLAG", default_value = "F")]
    #[serde(default = "default_flag_code")]
    pub flag: String,
}

fn default_registration_code() -> String {
    "R".to_string()
}

fn default_registration_lmp_code() -> String {
    "P".to_string()
}

fn default_delivery_code() -> String {
    "D".to_string()
}

fn default_visit_code() -> String {
    "V".to_string()
}

fn default_flag_code() -> String {
    "F".to_string()
}

impl Default for FormCodeConfig {
    fn default() -> Self {
        Self {
            registration: default_registration_code(),
            registration_lmp: default_registration_lmp_code(),
            delivery: default_delivery_code(),
            visit: default_visit_code(),
            flag: default_flag_code(),
        }
    }
}

impl FormCodeConfig {
    fn codes(&self) -> HashMap<FormKind, String> {
        HashMap::from([
            (FormKind::Registration, self.registration.clone()),
            (FormKind::RegistrationLmp, self.registration_lmp.clone()),
            (FormKind::Delivery, self.delivery.clone()),
            (FormKind::Visit, self.visit.clone()),
            (FormKind::Flag, self.flag.clone()),
        ])
    }

    /// Converts the configured codes into a validated [`FormCodeMap`].
    pub fn to_map(&self) -> Result<FormCodeMap, ConfigError> {
        FormCodeMap::new(self.codes())
    }
}

/// Configuration for the antenatal query layer.
///
/// Can be constructed from environment variables using [`AncConfig::from_env`],
/// from command line arguments using [`AncConfig::parse`], deserialized, or
/// built programmatically.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "helios-anc")]
#[command(about = "Antenatal care query layer")]
pub struct AncConfig {
    /// Maximum number of boolean conditions in a single engine query.
    #[arg(long, env = "ANC_MAX_CLAUSES", default_value = "1000")]
    #[serde(default = "default_max_clauses")]
    pub max_clauses: usize,

    /// Lower bound of the default registration window, in weeks before now.
    #[arg(long, env = "ANC_MIN_WEEKS_PREGNANT", default_value = "0")]
    #[serde(default)]
    pub min_weeks_pregnant: u32,

    /// Upper bound of the default registration window, in weeks before now.
    #[arg(long, env = "ANC_MAX_WEEKS_PREGNANT", default_value = "42")]
    #[serde(default = "default_max_weeks_pregnant")]
    pub max_weeks_pregnant: u32,

    /// Minimum weeks pregnant for a registration to count as birth-eligible.
    #[arg(long, env = "ANC_BIRTH_MIN_WEEKS_PREGNANT", default_value = "42")]
    #[serde(default = "default_birth_min_weeks_pregnant")]
    pub birth_min_weeks_pregnant: u32,

    /// Oldest registration, in weeks, still considered for birth eligibility.
    #[arg(long, env = "ANC_BIRTH_MAX_WEEKS_PREGNANT", default_value = "104")]
    #[serde(default = "default_birth_max_weeks_pregnant")]
    pub birth_max_weeks_pregnant: u32,

    /// Maximum rows returned per engine call by the named queries.
    #[arg(long, env = "ANC_QUERY_LIMIT", default_value = "10000")]
    #[serde(default = "default_query_limit")]
    pub query_limit: u32,

    /// Days past now that open-ended visit ranges still include.
    #[arg(long, env = "ANC_VISIT_LOOKAHEAD_DAYS", default_value = "2")]
    #[serde(default = "default_visit_lookahead_days")]
    pub visit_lookahead_days: u32,

    /// Form codes.
    #[command(flatten)]
    #[serde(default)]
    pub forms: FormCodeConfig,

    /// Base URL of the full-text endpoint.
    #[arg(long, env = "ANC_ENGINE_URL", default_value = "http://localhost:5984")]
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Database holding the indexed records.
    #[arg(long, env = "ANC_ENGINE_DATABASE", default_value = "medic")]
    #[serde(default = "default_engine_database")]
    pub engine_database: String,

    /// Design document defining the full-text index.
    #[arg(long, env = "ANC_ENGINE_DESIGN_DOC", default_value = "medic")]
    #[serde(default = "default_engine_design_doc")]
    pub engine_design_doc: String,

    /// Name of the full-text index.
    #[arg(long, env = "ANC_ENGINE_INDEX", default_value = "data_records")]
    #[serde(default = "default_engine_index")]
    pub engine_index: String,

    /// Transport timeout (e.g. `30s`, `1m 30s`).
    #[arg(long, env = "ANC_ENGINE_TIMEOUT", default_value = "30s")]
    #[serde(default = "default_engine_timeout")]
    pub engine_timeout: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ANC_LOG_LEVEL", default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_clauses() -> usize {
    DEFAULT_MAX_CLAUSES
}

fn default_max_weeks_pregnant() -> u32 {
    42
}

fn default_birth_min_weeks_pregnant() -> u32 {
    42
}

fn default_birth_max_weeks_pregnant() -> u32 {
    104
}

fn default_query_limit() -> u32 {
    10_000
}

fn default_visit_lookahead_days() -> u32 {
    2
}

fn default_engine_url() -> String {
    "http://localhost:5984".to_string()
}

fn default_engine_database() -> String {
    "medic".to_string()
}

fn default_engine_design_doc() -> String {
    "medic".to_string()
}

fn default_engine_index() -> String {
    "data_records".to_string()
}

fn default_engine_timeout() -> String {
    "30s".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AncConfig {
    fn default() -> Self {
        Self {
            max_clauses: default_max_clauses(),
            min_weeks_pregnant: 0,
            max_weeks_pregnant: default_max_weeks_pregnant(),
            birth_min_weeks_pregnant: default_birth_min_weeks_pregnant(),
            birth_max_weeks_pregnant: default_birth_max_weeks_pregnant(),
            query_limit: default_query_limit(),
            visit_lookahead_days: default_visit_lookahead_days(),
            forms: FormCodeConfig::default(),
            engine_url: default_engine_url(),
            engine_database: default_engine_database(),
            engine_design_doc: default_engine_design_doc(),
            engine_index: default_engine_index(),
            engine_timeout: default_engine_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl AncConfig {
    /// Creates a configuration from environment variables only.
    ///
    /// Process arguments are ignored; unset variables take their defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["helios-anc"]).unwrap_or_default()
    }

    /// Returns the validated form-code table.
    pub fn form_codes(&self) -> Result<FormCodeMap, ConfigError> {
        self.forms.to_map()
    }

    /// Returns the parsed transport timeout.
    pub fn engine_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.engine_timeout).map_err(|e| ConfigError::InvalidValue {
            field: "engine_timeout".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_clauses == 0 {
            errors.push("Max clauses cannot be 0".to_string());
        }

        if self.min_weeks_pregnant > self.max_weeks_pregnant {
            errors.push("Min weeks pregnant cannot exceed max weeks pregnant".to_string());
        }

        if self.birth_min_weeks_pregnant > self.birth_max_weeks_pregnant {
            errors.push(
                "Birth min weeks pregnant cannot exceed birth max weeks pregnant".to_string(),
            );
        }

        if self.query_limit == 0 {
            errors.push("Query limit cannot be 0".to_string());
        }

        if let Err(e) = self.form_codes() {
            errors.push(e.to_string());
        }

        match self.engine_timeout() {
            Ok(timeout) if timeout.is_zero() => {
                errors.push("Engine timeout cannot be 0".to_string());
            }
            Ok(_) => {}
            Err(e) => errors.push(e.to_string()),
        }

        if self.engine_url.trim().is_empty() {
            errors.push("Engine URL cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses a tiny clause limit so chunking is exercised with few identifiers.
    pub fn for_testing() -> Self {
        Self {
            max_clauses: 2,
            engine_url: "http://localhost:0".to_string(),
            engine_timeout: "5s".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AncConfig::default();
        assert_eq!(config.max_clauses, 1000);
        assert_eq!(config.min_weeks_pregnant, 0);
        assert_eq!(config.max_weeks_pregnant, 42);
        assert_eq!(config.visit_lookahead_days, 2);
        assert_eq!(config.birth_min_weeks_pregnant, 42);
        assert_eq!(config.birth_max_weeks_pregnant, 104);
        assert_eq!(config.query_limit, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_form_codes() {
        let forms = AncConfig::default().form_codes().unwrap();
        assert_eq!(forms.code(FormKind::Registration), "R");
        assert_eq!(forms.code(FormKind::RegistrationLmp), "P");
        assert_eq!(forms.code(FormKind::Delivery), "D");
        assert_eq!(forms.code(FormKind::Visit), "V");
        assert_eq!(forms.code(FormKind::Flag), "F");
        assert_eq!(forms.kind_of("P"), Some(FormKind::RegistrationLmp));
        assert_eq!(forms.kind_of("X"), None);
    }

    #[test]
    fn test_missing_form_code_rejected() {
        let codes = HashMap::from([(FormKind::Registration, "R".to_string())]);
        let err = FormCodeMap::new(codes).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingFormCode {
                form: "registration_lmp".to_string()
            }
        );
    }

    #[test]
    fn test_blank_form_code_rejected() {
        let config = AncConfig {
            forms: FormCodeConfig {
                flag: "  ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("flag")));
    }

    #[test]
    fn test_validate_invalid_values() {
        let config = AncConfig {
            max_clauses: 0,
            min_weeks_pregnant: 50,
            engine_timeout: "soon".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_validate_birth_window_and_limit() {
        let config = AncConfig {
            birth_min_weeks_pregnant: 60,
            birth_max_weeks_pregnant: 50,
            query_limit: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("Query limit")));
    }

    #[test]
    fn test_birth_settings_deserialize_independently() {
        let config: AncConfig = serde_json::from_str(r#"{"max_weeks_pregnant": 30}"#).unwrap();
        assert_eq!(config.max_weeks_pregnant, 30);
        assert_eq!(config.birth_min_weeks_pregnant, 42);
        assert_eq!(config.birth_max_weeks_pregnant, 104);
    }

    #[test]
    fn test_engine_timeout_parsing() {
        let config = AncConfig {
            engine_timeout: "1m 30s".to_string(),
            ..Default::default()
        };
        assert_eq!(config.engine_timeout().unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AncConfig =
            serde_json::from_str(r#"{"max_clauses": 10, "forms": {"visit": "ANCV"}}"#).unwrap();
        assert_eq!(config.max_clauses, 10);
        assert_eq!(config.max_weeks_pregnant, 42);
        let forms = config.form_codes().unwrap();
        assert_eq!(forms.code(FormKind::Visit), "ANCV");
        assert_eq!(forms.code(FormKind::Delivery), "D");
    }

    #[test]
    fn test_for_testing() {
        let config = AncConfig::for_testing();
        assert_eq!(config.max_clauses, 2);
        assert_eq!(config.log_level, "debug");
        assert!(config.validate().is_ok());
    }
}
