// src/error.rs

//! Unified error handling for the sync job.

use std::fmt;

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Object store error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-success status
    #[error("GET {url} returned {status}")]
    Api { status: u16, url: String },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV encoding/decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream data no longer has the expected shape
    #[error("Data integrity error: {0}")]
    Integrity(String),

    /// A run stage failed
    #[error("{stage}: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Create an object store error.
    pub fn s3(message: impl fmt::Display) -> Self {
        Self::S3(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a data integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Wrap an error with the name of the run stage it came from.
    pub fn stage(stage: &'static str, source: AppError) -> Self {
        Self::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Whether this error (or the error it wraps) is an integrity violation.
    pub fn is_integrity(&self) -> bool {
        match self {
            Self::Integrity(_) => true,
            Self::Stage { source, .. } => source.is_integrity(),
            _ => false,
        }
    }
}

/// Attach a stage name to the error of a fallible step.
pub trait StageExt<T> {
    fn stage(self, stage: &'static str) -> Result<T>;
}

impl<T> StageExt<T> for Result<T> {
    fn stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|e| AppError::stage(stage, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_prefix_in_message() {
        let err: Result<()> = Err(AppError::validation("bad watermark"));
        let err = err.stage("fetch latest watermark").unwrap_err();
        assert_eq!(
            err.to_string(),
            "fetch latest watermark: Validation error: bad watermark"
        );
    }

    #[test]
    fn test_integrity_seen_through_stage() {
        let err = AppError::stage("collect events", AppError::integrity("51 idols"));
        assert!(err.is_integrity());
        assert!(!AppError::config("x").is_integrity());
    }
}
