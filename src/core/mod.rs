//! Core business logic for NextMed.
//!
//! This module turns a recorded clinical note into a structured patient record.
//!
//! # Modules
//!
//! - [`ingestion`] - Audio upload validation and storage
//! - [`transcription`] - Transcription job submission, bounded polling, result parsing
//! - [`mapping`] - Template-driven field mapping strategies
//! - [`pipeline`] - End-to-end coordination and the single persistence step
//! - [`jobs`] - Background pipeline jobs with status and cancellation
//! - [`templates`] - Default templates, doctor customization, field edits
//!
//! # Pipeline Workflow
//!
//! 1. **Resolve**: Parse ids and load the template (input errors stop here)
//! 2. **Ingest**: Store the audio under `uploads/{millis}_{file}`
//! 3. **Transcribe**: Submit a job, poll until terminal, read `{job}.json`
//! 4. **Extract**: Detect medical entities in the transcript
//! 5. **Map**: Fill the template fields with the configured strategy
//! 6. **Persist**: Write the patient and its transcription atomically
//!
//! # Example
//!
//! ```rust,no_run
//! use nextmed::adapters::factory::{create_cloud_services, create_database};
//! use nextmed::config::load_config;
//! use nextmed::core::pipeline::{PipelineCoordinator, ProcessRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("nextmed.toml")?;
//! let database = create_database(&config).await?;
//! let cloud = create_cloud_services(&config).await;
//!
//! let coordinator = PipelineCoordinator::from_config(&config, &cloud, database)?;
//! let outcome = coordinator
//!     .process_transcript(ProcessRequest {
//!         transcription_text: "My name is Jane, I am 34 years old".to_string(),
//!         doctor_id: "7d44b88c-4199-4bad-97dc-d78268e01398".to_string(),
//!         template_id: "0b0e6a5c-4f2d-4a5e-9c39-5d1f2a7e8b11".to_string(),
//!     })
//!     .await?;
//!
//! println!("Patient: {}", outcome.patient.name);
//! # Ok(())
//! # }
//! ```

pub mod ingestion;
pub mod jobs;
pub mod mapping;
pub mod pipeline;
pub mod templates;
pub mod transcription;
