//! Helios Antenatal Care Query Layer
//!
//! This crate answers antenatal-care questions over a full-text index of
//! clinical reports: who is registered and how far along, who has delivered,
//! how many visits each patient has had, and who is flagged high risk.
//!
//! # Features
//!
//! - **Named Queries**: Registrations, deliveries, visits, and high-risk flags
//! - **Chunked Execution**: Long patient filters are split to respect the engine clause limit
//! - **Enrichment**: Visit counts and risk flags joined onto caller entities
//! - **Derived Metrics**: Weeks pregnant and estimated due date
//!
//! Available transport features:
//! - `lucene` (default) - couchdb-lucene style HTTP endpoint via reqwest
//!
//! # Architecture
//!
//! - [`types`] - Records, query options, and results
//! - [`search`] - Query formatting, the [`SearchEngine`] boundary, and chunked execution
//! - [`queries`] - The named antenatal queries
//! - [`enrichment`] - Visit and risk joins
//! - [`metrics`] - Gestational age and due dates
//! - [`config`] - Environment-driven configuration
//! - [`clock`] - Injectable time source
//! - [`error`] - Error types for all operations
//! - [`backends`] - Engine transports
//!
//! # Quick Start
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use helios_anc::search::formatter::format_date_range;
//!
//! let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap();
//!
//! // The upper bound is the day after `end` so the whole last day matches.
//! assert_eq!(
//!     format_date_range("reported_date", &start, &end),
//!     "reported_date<date>:[2024-03-01 TO 2024-04-01]"
//! );
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod clock;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod metrics;
pub mod queries;
pub mod search;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AncConfig, FormCodeMap, FormKind};
pub use error::{AncError, AncResult, ConfigError, EngineError, EngineResult};
pub use queries::{AncQueries, DeliveryQuery, QuerySettings, RegistrationQuery, VisitQuery};
pub use search::{ChunkedQueryExecutor, EngineResponse, SearchEngine, SearchRequest};
pub use types::{
    DateRange, MergedResult, PatientEntity, PatientRecord, QueryOptions, SearchResult, SearchRow,
};

#[cfg(feature = "lucene")]
pub use backends::lucene::{LuceneConfig, LuceneEngine};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initializes a `tracing` subscriber writing to stdout.
///
/// `RUST_LOG` takes precedence; otherwise this crate logs at `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_anc={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
