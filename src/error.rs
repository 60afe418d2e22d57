//! Error types for CityScout
//!
//! Defines the error enum covering all failure modes across the system.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for CityScout operations
pub type Result<T> = std::result::Result<T, CityScoutError>;

/// Comprehensive error type for CityScout operations
#[derive(Error, Debug)]
pub enum CityScoutError {
    /// Configuration errors (bad config file, missing timeout entry)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream provider returned zero usable entries
    #[error("No data from upstream for {0}")]
    NoData(String),

    /// Descriptor is missing parameters its upstream fetch needs
    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    /// SQLite database errors
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),

    /// Anyhow errors (for more context)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message() {
        let err = CityScoutError::NoData("weather".to_string());
        assert_eq!(err.to_string(), "No data from upstream for weather");
    }

    #[test]
    fn test_config_message() {
        let err = CityScoutError::Config("no timeout for resource type 'event'".to_string());
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
