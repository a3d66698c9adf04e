//! Domain error types
//!
//! This module defines the error hierarchy for NextMed.
//! All errors are domain-specific and don't expose third-party SDK types.

use thiserror::Error;

/// Main NextMed error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum NextMedError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation errors (missing file, missing or malformed ids)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Object store, transcription or entity extraction backend failure
    #[error("External service error: {0}")]
    External(#[from] ExternalServiceError),

    /// Transcription result artifact did not have the expected shape
    #[error("Failed to extract transcription text: {0}")]
    TranscriptFormat(String),

    /// A bounded wait elapsed
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Work was cancelled before it finished
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the cloud collaborators of the pipeline
///
/// Each variant carries the contextual message produced by the adapter.
/// None of them are retried: every external call is at-most-once.
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    /// Audio upload to the object store failed
    #[error("Failed to upload audio: {0}")]
    UploadFailed(String),

    /// Object download failed
    #[error("Failed to retrieve transcription result: {0}")]
    DownloadFailed(String),

    /// The transcription backend rejected the job
    #[error("Failed to start transcription job: {0}")]
    JobSubmissionFailed(String),

    /// Polling the job status failed
    #[error("Failed to query transcription job status: {0}")]
    JobStatusFailed(String),

    /// The transcription job reached the FAILED state
    #[error("Transcription job {job_name} failed: {reason}")]
    JobFailed { job_name: String, reason: String },

    /// Entity recognition call failed
    #[error("Entity detection failed: {0}")]
    EntityDetectionFailed(String),
}

impl NextMedError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            NextMedError::Configuration(_) => "configuration",
            NextMedError::Validation(_) => "validation",
            NextMedError::NotFound(_) => "not_found",
            NextMedError::Conflict(_) => "conflict",
            NextMedError::External(_) => "external_service",
            NextMedError::TranscriptFormat(_) => "transcript_format",
            NextMedError::Timeout(_) => "timeout",
            NextMedError::Cancelled(_) => "cancelled",
            NextMedError::Database(_) => "database",
            NextMedError::Serialization(_) => "serialization",
            NextMedError::Io(_) => "io",
            NextMedError::Other(_) => "internal",
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            NextMedError::Validation(_) | NextMedError::NotFound(_) | NextMedError::Conflict(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for NextMedError {
    fn from(err: std::io::Error) -> Self {
        NextMedError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for NextMedError {
    fn from(err: serde_json::Error) -> Self {
        NextMedError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for NextMedError {
    fn from(err: toml::de::Error) -> Self {
        NextMedError::Configuration(format!("TOML parse error: {err}"))
    }
}
