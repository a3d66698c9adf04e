//! Domain models and types for NextMed.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TemplateId`], [`DoctorId`], [`PatientId`], [`JobName`])
//! - **Domain models** ([`Template`], [`Patient`], [`Doctor`], [`Transcription`])
//! - **Error types** ([`NextMedError`], [`ExternalServiceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers are UUID newtypes, so they cannot be mixed up:
//!
//! ```rust
//! use nextmed::domain::{DoctorId, TemplateId};
//!
//! let template_id = TemplateId::new();
//! let doctor_id = DoctorId::parse("7d44b88c-4199-4bad-97dc-d78268e01398").unwrap();
//!
//! // let wrong: TemplateId = doctor_id;  // Compile error!
//! # let _ = (template_id, doctor_id);
//! ```
//!
//! # Missing values
//!
//! Patient fields use [`FieldValue`], which separates "nothing was found"
//! from any extracted string:
//!
//! ```rust
//! use nextmed::domain::FieldValue;
//!
//! let missing = FieldValue::Missing;
//! let literal = FieldValue::from("N/A");
//! assert_ne!(missing, literal);
//! ```

pub mod doctor;
pub mod errors;
pub mod ids;
pub mod patient;
pub mod result;
pub mod template;
pub mod transcription;

// Re-export commonly used types for convenience
pub use doctor::{Doctor, DoctorRole};
pub use errors::{ExternalServiceError, NextMedError};
pub use ids::{DoctorId, JobName, PatientId, PipelineJobId, TemplateId, TranscriptionId};
pub use patient::{FieldValue, Patient, PatientFields, UNKNOWN_PATIENT_NAME};
pub use result::Result;
pub use template::{Field, FieldType, Template, TemplateBuilder};
pub use transcription::{ExtractedEntity, Transcription};
