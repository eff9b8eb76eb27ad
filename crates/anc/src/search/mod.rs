//! Query building and execution against the full-text engine.
//!
//! - [`formatter`] - Query fragment builders (date ranges, form, district, patients)
//! - [`engine`] - The [`SearchEngine`] boundary trait
//! - [`executor`] - [`ChunkedQueryExecutor`], which respects the engine clause limit

pub mod engine;
pub mod executor;
pub mod formatter;

pub use engine::{EngineResponse, SearchEngine, SearchRequest};
pub use executor::ChunkedQueryExecutor;
