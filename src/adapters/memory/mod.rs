//! In-process persistence
//!
//! [`MemoryDatabase`] keeps every record in tokio `RwLock` maps and enforces
//! the same uniqueness rules as the PostgreSQL schema. Data is lost on
//! restart; it backs `database_target = "memory"` and the test suite.

use crate::adapters::database::traits::{
    Database, DoctorRepository, PatientRepository, TemplateRepository, TranscriptionRepository,
};
use crate::domain::ids::{DoctorId, PatientId, TemplateId, TranscriptionId};
use crate::domain::{Doctor, NextMedError, Patient, Result, Template, Transcription};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    templates: HashMap<TemplateId, Template>,
    patients: HashMap<PatientId, Patient>,
    doctors: HashMap<DoctorId, Doctor>,
    transcriptions: HashMap<TranscriptionId, Transcription>,
}

impl Tables {
    fn default_template_taken(&self, template: &Template) -> bool {
        template.is_default()
            && self.templates.values().any(|existing| {
                existing.id != template.id
                    && existing.is_default()
                    && existing.name == template.name
                    && existing.specialty == template.specialty
            })
    }
}

/// In-memory implementation of the persistence traits
///
/// Clones share the same tables. A single lock guards all tables so
/// multi-record writes are atomic.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored patients
    pub async fn patient_count(&self) -> usize {
        self.tables.read().await.patients.len()
    }

    /// Number of stored transcription records
    pub async fn transcription_count(&self) -> usize {
        self.tables.read().await.transcriptions.len()
    }
}

fn duplicate_default() -> NextMedError {
    NextMedError::Conflict(
        "A default template with this name and specialty already exists".to_string(),
    )
}

#[async_trait]
impl TemplateRepository for MemoryDatabase {
    async fn insert_template(&self, template: &Template) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.templates.contains_key(&template.id) {
            return Err(NextMedError::Conflict(format!(
                "Template {} already exists",
                template.id
            )));
        }
        if tables.default_template_taken(template) {
            return Err(duplicate_default());
        }
        tables.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>> {
        Ok(self.tables.read().await.templates.get(id).cloned())
    }

    async fn update_template(&self, template: &Template) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.templates.contains_key(&template.id) {
            return Err(NextMedError::NotFound(format!(
                "Template {} not found",
                template.id
            )));
        }
        if tables.default_template_taken(template) {
            return Err(duplicate_default());
        }
        tables.templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<bool> {
        Ok(self.tables.write().await.templates.remove(id).is_some())
    }

    async fn list_default_templates(&self, specialty: &str) -> Result<Vec<Template>> {
        let tables = self.tables.read().await;
        let mut templates: Vec<Template> = tables
            .templates
            .values()
            .filter(|t| t.is_default() && t.specialty == specialty)
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn list_doctor_templates(&self, doctor_id: &DoctorId) -> Result<Vec<Template>> {
        let tables = self.tables.read().await;
        let mut templates: Vec<Template> = tables
            .templates
            .values()
            .filter(|t| t.doctor_id.as_ref() == Some(doctor_id))
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }
}

#[async_trait]
impl PatientRepository for MemoryDatabase {
    async fn get_patient(&self, id: &PatientId) -> Result<Option<Patient>> {
        Ok(self.tables.read().await.patients.get(id).cloned())
    }

    async fn list_patients_by_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Patient>> {
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| &p.doctor_id == doctor_id)
            .cloned()
            .collect();
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(patients)
    }

    async fn create_patient_with_transcription(
        &self,
        patient: &Patient,
        transcription: Option<&Transcription>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;

        if tables.patients.contains_key(&patient.id) {
            return Err(NextMedError::Conflict(format!(
                "Patient {} already exists",
                patient.id
            )));
        }
        if let Some(transcription) = transcription {
            if tables.transcriptions.contains_key(&transcription.id) {
                return Err(NextMedError::Conflict(format!(
                    "Transcription {} already exists",
                    transcription.id
                )));
            }
            if transcription.patient_id != patient.id {
                return Err(NextMedError::Validation(
                    "Transcription must reference the patient being created".to_string(),
                ));
            }
        }

        tables.patients.insert(patient.id, patient.clone());
        if let Some(transcription) = transcription {
            tables
                .transcriptions
                .insert(transcription.id, transcription.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DoctorRepository for MemoryDatabase {
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.doctors.values().any(|d| d.email == doctor.email) {
            return Err(NextMedError::Conflict(
                "A doctor with this email already exists".to_string(),
            ));
        }
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(())
    }

    async fn get_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>> {
        Ok(self.tables.read().await.doctors.get(id).cloned())
    }

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .tables
            .read()
            .await
            .doctors
            .values()
            .find(|d| d.email == email)
            .cloned())
    }
}

#[async_trait]
impl TranscriptionRepository for MemoryDatabase {
    async fn get_transcription(&self, id: &TranscriptionId) -> Result<Option<Transcription>> {
        Ok(self.tables.read().await.transcriptions.get(id).cloned())
    }

    async fn list_transcriptions_by_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Transcription>> {
        let tables = self.tables.read().await;
        let mut records: Vec<Transcription> = tables
            .transcriptions
            .values()
            .filter(|t| &t.patient_id == patient_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DoctorRole, Field, FieldType, PatientFields};

    fn default_template(name: &str, specialty: &str) -> Template {
        Template::builder()
            .name(name)
            .specialty(specialty)
            .field(Field::new("Symptoms", FieldType::Text, true))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_default_template_conflicts() {
        let db = MemoryDatabase::new();
        db.insert_template(&default_template("Initial Visit", "Gynecology"))
            .await
            .unwrap();

        let err = db
            .insert_template(&default_template("Initial Visit", "Gynecology"))
            .await
            .unwrap_err();
        assert!(matches!(err, NextMedError::Conflict(_)));

        db.insert_template(&default_template("Initial Visit", "Cardiology"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_owned_templates_may_share_name() {
        let db = MemoryDatabase::new();
        let source = default_template("Initial Visit", "Gynecology");
        db.insert_template(&source).await.unwrap();

        let doctor = DoctorId::new();
        db.insert_template(&source.fork_for(doctor, "Initial Visit"))
            .await
            .unwrap();
        db.insert_template(&source.fork_for(doctor, "Initial Visit"))
            .await
            .unwrap();

        assert_eq!(db.list_doctor_templates(&doctor).await.unwrap().len(), 2);
        assert_eq!(db.list_default_templates("Gynecology").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_template() {
        let db = MemoryDatabase::new();
        let err = db
            .update_template(&default_template("Initial Visit", "Gynecology"))
            .await
            .unwrap_err();
        assert!(matches!(err, NextMedError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_patient_and_transcription_written_together() {
        let db = MemoryDatabase::new();
        let patient = Patient::new(
            Some("Jane".to_string()),
            TemplateId::new(),
            DoctorId::new(),
            PatientFields::new(),
        );
        let mismatched = Transcription::new(
            patient.doctor_id,
            PatientId::new(),
            "text",
            serde_json::json!({}),
        );

        assert!(db
            .create_patient_with_transcription(&patient, Some(&mismatched))
            .await
            .is_err());
        assert_eq!(db.patient_count().await, 0);

        let transcription =
            Transcription::new(patient.doctor_id, patient.id, "text", serde_json::json!({}));
        db.create_patient_with_transcription(&patient, Some(&transcription))
            .await
            .unwrap();
        assert_eq!(db.patient_count().await, 1);
        assert_eq!(
            db.list_transcriptions_by_patient(&patient.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_doctor_email_unique() {
        let db = MemoryDatabase::new();
        let doctor = Doctor::new("Dr. Ada", "Ada@Example.com", "hash", "General", DoctorRole::Doctor);
        db.insert_doctor(&doctor).await.unwrap();

        let again = Doctor::new("Dr. Ada", "ada@example.com", "hash", "General", DoctorRole::Doctor);
        assert!(matches!(
            db.insert_doctor(&again).await,
            Err(NextMedError::Conflict(_))
        ));

        let found = db.find_doctor_by_email("ADA@example.com").await.unwrap();
        assert_eq!(found.map(|d| d.id), Some(doctor.id));
    }
}
