//! Error types for the capacity inventory
//!
//! Provides structured error types for collection, vendor output parsing,
//! aggregation and metrics publishing.

use thiserror::Error;

/// Unified error type for the inventory run
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Collection Errors
    // =========================================================================
    #[error("Connection failed for array {array}: {primary}; fallback: {fallback}")]
    ConnectionFailure {
        array: String,
        primary: String,
        fallback: String,
    },

    #[error("Command failed on array {array}: `{command}`: {reason}")]
    CommandExecutionFailure {
        array: String,
        command: String,
        reason: String,
    },

    #[error("Collection from array {array} timed out after {seconds}s")]
    CollectionTimeout { array: String, seconds: u64 },

    #[error("Vendor model not supported: {model}")]
    UnsupportedVendor { model: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Unable to parse {vendor} output from array {array}: {reason}")]
    ParseFailure {
        vendor: String,
        array: String,
        reason: String,
    },

    #[error("Malformed capacity value: {value:?}")]
    MalformedCapacityValue { value: String },

    #[error("Pool {pool} on array {array} reports zero total capacity")]
    DivisionByZeroCapacity { array: String, pool: String },

    // =========================================================================
    // Publish Errors
    // =========================================================================
    #[error("Metrics publish to {endpoint} failed: {reason}")]
    PublishFailure { endpoint: String, reason: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // =========================================================================
    // Inventory Errors
    // =========================================================================
    #[error("Inventory {path}: {reason}")]
    Inventory { path: String, reason: String },

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Unit of work an error is contained to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// One pool record or one published metrics record is lost
    Record,
    /// One array contributes nothing (or a partial set of pools)
    Array,
    /// The whole run cannot proceed
    Run,
}

impl Error {
    /// Determine how far this error reaches
    pub fn scope(&self) -> ErrorScope {
        match self {
            Error::MalformedCapacityValue { .. }
            | Error::DivisionByZeroCapacity { .. }
            | Error::PublishFailure { .. } => ErrorScope::Record,

            Error::ConnectionFailure { .. }
            | Error::CommandExecutionFailure { .. }
            | Error::CollectionTimeout { .. }
            | Error::UnsupportedVendor { .. }
            | Error::ParseFailure { .. } => ErrorScope::Array,

            Error::Internal(_)
            | Error::Configuration(_)
            | Error::Http(_)
            | Error::Inventory { .. }
            | Error::JsonParse(_)
            | Error::YamlParse(_)
            | Error::Io(_) => ErrorScope::Run,
        }
    }

    /// Check if this error must abort the run
    pub fn is_fatal(&self) -> bool {
        self.scope() == ErrorScope::Run
    }
}

/// Result type alias for the inventory
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_scopes() {
        let err = Error::MalformedCapacityValue {
            value: "abcTB".into(),
        };
        assert_eq!(err.scope(), ErrorScope::Record);

        let err = Error::ConnectionFailure {
            array: "v7k-01".into(),
            primary: "auth refused".into(),
            fallback: "auth refused".into(),
        };
        assert_eq!(err.scope(), ErrorScope::Array);

        let err = Error::Configuration("no inventory".into());
        assert_eq!(err.scope(), ErrorScope::Run);
    }

    #[test]
    fn test_publish_failure_is_not_fatal() {
        let err = Error::PublishFailure {
            endpoint: "http://influx:8086/write".into(),
            reason: "503 Service Unavailable".into(),
        };
        assert!(!err.is_fatal());

        let err = Error::Inventory {
            path: "IBM.json".into(),
            reason: "missing".into(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_connection_failure_message_carries_both_attempts() {
        let err = Error::ConnectionFailure {
            array: "oceanstor-02".into(),
            primary: "password rejected".into(),
            fallback: "challenge rejected".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("oceanstor-02"));
        assert!(msg.contains("password rejected"));
        assert!(msg.contains("challenge rejected"));
    }
}
