//! # Application Error Types
//!
//! This module defines the error types used throughout the glyph extraction
//! pipeline. Failures are local to the page being processed; only a missing
//! input directory or an invalid configuration stops a whole run.

use std::fmt;

/// General error type for extraction runs
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Configuration validation errors
    Config(String),
    /// Source page could not be read or decoded
    ImageLoad(String),
    /// Image processing stage failed
    Processing(String),
    /// File system errors (directory creation, PNG writes)
    FileSystem(String),
    /// Metadata (de)serialization errors
    Metadata(String),
    /// Input directory missing or unreadable
    InputDirectory(String),
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            ExtractionError::ImageLoad(msg) => write!(f, "[IMAGE_LOAD] {}", msg),
            ExtractionError::Processing(msg) => write!(f, "[PROCESSING] {}", msg),
            ExtractionError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            ExtractionError::Metadata(msg) => write!(f, "[METADATA] {}", msg),
            ExtractionError::InputDirectory(msg) => write!(f, "[INPUT_DIR] {}", msg),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl ExtractionError {
    /// Whether this error should halt the whole run instead of just one page
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExtractionError::Config(_) | ExtractionError::InputDirectory(_)
        )
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::FileSystem(err.to_string())
    }
}

impl From<image::ImageError> for ExtractionError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => ExtractionError::FileSystem(io.to_string()),
            other => ExtractionError::ImageLoad(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ExtractionError {
    fn from(err: serde_json::Error) -> Self {
        ExtractionError::Metadata(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessingError> for ExtractionError {
    fn from(err: crate::preprocessing::PreprocessingError) -> Self {
        ExtractionError::Processing(err.to_string())
    }
}

/// Result type alias for convenience
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Standardized error logging utilities for consistent reporting across the pipeline
pub mod error_logging {
    use tracing::{error, warn};

    /// Log a page that was skipped; the run continues with the next page
    pub fn log_page_skipped(
        error: &impl std::fmt::Display,
        page: &str,
        stage: &str,
        processing_duration: Option<std::time::Duration>,
    ) {
        warn!(
            error = %error,
            page = %page,
            stage = %stage,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "Page skipped"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }

    /// Log configuration errors during startup
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            "Configuration error"
        );
    }
}
