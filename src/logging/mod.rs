//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable or JSON console output
//! - Configurable log levels
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use nextmed::logging::init_logging;
//! use nextmed::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the completion of a pipeline stage
///
/// # Example
///
/// ```no_run
/// use nextmed::log_pipeline_stage;
/// use std::time::Instant;
///
/// let started = Instant::now();
/// log_pipeline_stage!("ingestion", started);
/// log_pipeline_stage!("extraction", started, entity_count = 4);
/// ```
#[macro_export]
macro_rules! log_pipeline_stage {
    ($stage:expr, $started:expr) => {
        tracing::info!(
            stage = $stage,
            duration_ms = $started.elapsed().as_millis() as u64,
            "Pipeline stage completed"
        );
    };
    ($stage:expr, $started:expr, $($field:tt)+) => {
        tracing::info!(
            stage = $stage,
            duration_ms = $started.elapsed().as_millis() as u64,
            $($field)+,
            "Pipeline stage completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use nextmed::log_error_with_context;
/// use nextmed::domain::NextMedError;
///
/// let error = NextMedError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a background job status change
///
/// # Example
///
/// ```no_run
/// use nextmed::log_job_transition;
///
/// log_job_transition!("0b0e6a5c-4f2d-4a5e-9c39-5d1f2a7e8b11", "submitted", "running");
/// ```
#[macro_export]
macro_rules! log_job_transition {
    ($job_id:expr, $from:expr, $to:expr) => {
        tracing::info!(
            job_id = %$job_id,
            from = %$from,
            to = %$to,
            "Pipeline job status changed"
        );
    };
}
