//! Error types for the geo load-test crates.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Primary error type for store and benchmark operations.
#[derive(Debug, Error)]
pub enum GeoError {
    // === Store Errors ===
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Request timeout")]
    Timeout,

    // === Configuration Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    // === Benchmark Errors ===
    #[error("Seeding failed: all {attempted} inserts into '{key}' failed")]
    SeedFailed { key: String, attempted: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GeoError {
    /// Whether the error came from the store connection itself rather than the command.
    ///
    /// A pooled connection that produced such an error is not reused.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, GeoError::Connection(_) | GeoError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_failed_message() {
        let err = GeoError::SeedFailed {
            key: "1700000000".to_string(),
            attempted: 42,
        };
        assert_eq!(
            err.to_string(),
            "Seeding failed: all 42 inserts into '1700000000' failed"
        );
    }

    #[test]
    fn test_connection_errors() {
        assert!(GeoError::Timeout.is_connection_error());
        assert!(GeoError::Connection("refused".into()).is_connection_error());
        assert!(!GeoError::Command("WRONGTYPE".into()).is_connection_error());
    }
}
