//! Error types for the antenatal query layer.
//!
//! Errors are split into engine failures (anything the full-text engine or its
//! transport reports) and configuration defects (form-code tables and settings
//! rejected at startup). Nothing in this crate swallows an error: every failure
//! reaches the original caller unchanged.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all query and enrichment operations.
#[derive(Error, Debug)]
pub enum AncError {
    /// The full-text engine or its transport failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors originating from the full-text search engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine could not be reached.
    #[error("search engine unavailable: {engine_name}: {message}")]
    Unavailable {
        engine_name: String,
        message: String,
    },

    /// The request exceeded the transport timeout.
    #[error("search engine request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The engine answered with a non-success status.
    #[error("search engine returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The engine response could not be decoded.
    #[error("failed to decode search engine response: {message}")]
    Decode { message: String },

    /// Internal engine error.
    #[error("internal error in {engine_name}: {message}")]
    Internal {
        engine_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Errors related to configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A logical form has no configured code.
    #[error("no form code configured for '{form}'")]
    MissingFormCode { form: String },

    /// A logical form is configured with a blank code.
    #[error("form code for '{form}' is empty")]
    EmptyFormCode { form: String },

    /// A setting has an unusable value.
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for query and enrichment operations.
pub type AncResult<T> = Result<T, AncError>;

/// Result type alias for engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Decode {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_is_transparent() {
        let err: AncError = EngineError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "search engine returned status 500: boom"
        );
        assert!(matches!(err, AncError::Engine(EngineError::Status { .. })));
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::MissingFormCode {
            form: "delivery".to_string(),
        };
        assert_eq!(err.to_string(), "no form code configured for 'delivery'");
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EngineError = json_err.into();
        assert!(matches!(err, EngineError::Decode { .. }));
    }
}
