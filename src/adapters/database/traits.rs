//! Database abstraction traits
//!
//! This module defines the repositories that persistence adapters must
//! implement to work with NextMed. Method names carry the entity they act on
//! so the combined [`Database`] trait object has no ambiguous calls.

use crate::domain::ids::{DoctorId, PatientId, TemplateId, TranscriptionId};
use crate::domain::{Doctor, Patient, Result, Template, Transcription};
use async_trait::async_trait;

/// Template persistence
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a new template
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::Conflict` if a default template with the same
    /// name and specialty already exists.
    async fn insert_template(&self, template: &Template) -> Result<()>;

    /// Fetch a template by id
    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>>;

    /// Replace a stored template
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::NotFound` if the template does not exist, or
    /// `NextMedError::Conflict` if the update collides with another default.
    async fn update_template(&self, template: &Template) -> Result<()>;

    /// Delete a template
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was removed.
    async fn delete_template(&self, id: &TemplateId) -> Result<bool>;

    /// Default templates (no owning doctor) of a specialty, ordered by name
    async fn list_default_templates(&self, specialty: &str) -> Result<Vec<Template>>;

    /// Templates owned by a doctor, newest first
    async fn list_doctor_templates(&self, doctor_id: &DoctorId) -> Result<Vec<Template>>;
}

/// Patient persistence
#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Fetch a patient by id
    async fn get_patient(&self, id: &PatientId) -> Result<Option<Patient>>;

    /// Patients recorded by a doctor, newest first
    async fn list_patients_by_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Patient>>;

    /// Persist a patient and its transcription audit record together
    ///
    /// Either both records are stored or neither is.
    ///
    /// # Arguments
    ///
    /// * `patient` - The patient record
    /// * `transcription` - Audit record referencing `patient.id`, if any
    async fn create_patient_with_transcription(
        &self,
        patient: &Patient,
        transcription: Option<&Transcription>,
    ) -> Result<()>;
}

/// Doctor account persistence
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    /// Insert a doctor account
    ///
    /// # Errors
    ///
    /// Returns `NextMedError::Conflict` if the email is already registered.
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()>;

    /// Fetch a doctor by id
    async fn get_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>>;

    /// Fetch a doctor by (lowercased) email
    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>>;
}

/// Transcription audit record persistence
#[async_trait]
pub trait TranscriptionRepository: Send + Sync {
    /// Fetch a transcription record by id
    async fn get_transcription(&self, id: &TranscriptionId) -> Result<Option<Transcription>>;

    /// Transcription records of a patient, oldest first
    async fn list_transcriptions_by_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Transcription>>;
}

/// A complete persistence backend
#[async_trait]
pub trait Database:
    TemplateRepository + PatientRepository + DoctorRepository + TranscriptionRepository
{
    /// Test the database connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and indexes if they don't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    async fn ensure_schema(&self) -> Result<()>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
