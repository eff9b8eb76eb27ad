//! Search engine transports.
//!
//! Available transports:
//! - `lucene` - couchdb-lucene style HTTP endpoint

#[cfg(feature = "lucene")]
pub mod lucene;
