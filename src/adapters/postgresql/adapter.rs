//! PostgreSQL adapter implementing the repository traits
//!
//! This module provides the implementation of [`Database`] and its
//! repositories for PostgreSQL.

use crate::adapters::database::traits::{
    Database, DoctorRepository, PatientRepository, TemplateRepository, TranscriptionRepository,
};
use crate::adapters::postgresql::client::{map_pg_error, PostgreSQLClient};
use crate::adapters::postgresql::models::{
    PostgreSQLDoctor, PostgreSQLPatient, PostgreSQLTemplate, PostgreSQLTranscription,
};
use crate::domain::ids::{DoctorId, PatientId, TemplateId, TranscriptionId};
use crate::domain::{Doctor, NextMedError, Patient, Result, Template, Transcription};
use async_trait::async_trait;
use std::sync::Arc;

/// PostgreSQL implementation of the persistence traits
///
/// This wraps the PostgreSQLClient; clones share the same pool.
#[derive(Clone)]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

#[async_trait]
impl TemplateRepository for PostgreSQLAdapter {
    async fn insert_template(&self, template: &Template) -> Result<()> {
        let row = PostgreSQLTemplate::from_domain(template)?;

        self.client
            .execute(
                "INSERT INTO templates (id, name, specialty, doctor_id, fields, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &row.id,
                    &row.name,
                    &row.specialty,
                    &row.doctor_id,
                    &row.fields,
                    &row.created_at,
                    &row.updated_at,
                ],
            )
            .await?;

        tracing::debug!(
            template_id = %template.id,
            default = template.is_default(),
            "Template inserted"
        );
        Ok(())
    }

    async fn get_template(&self, id: &TemplateId) -> Result<Option<Template>> {
        let query = format!(
            "SELECT {} FROM templates WHERE id = $1",
            PostgreSQLTemplate::COLUMNS
        );
        self.client
            .query_opt(&query, &[id.as_uuid()])
            .await?
            .map(|row| PostgreSQLTemplate::from_row(&row)?.into_domain())
            .transpose()
    }

    async fn update_template(&self, template: &Template) -> Result<()> {
        let row = PostgreSQLTemplate::from_domain(template)?;

        let affected = self
            .client
            .execute(
                "UPDATE templates
                 SET name = $2, specialty = $3, doctor_id = $4, fields = $5, updated_at = $6
                 WHERE id = $1",
                &[
                    &row.id,
                    &row.name,
                    &row.specialty,
                    &row.doctor_id,
                    &row.fields,
                    &row.updated_at,
                ],
            )
            .await?;

        if affected == 0 {
            return Err(NextMedError::NotFound(format!(
                "Template {} not found",
                template.id
            )));
        }
        Ok(())
    }

    async fn delete_template(&self, id: &TemplateId) -> Result<bool> {
        let affected = self
            .client
            .execute("DELETE FROM templates WHERE id = $1", &[id.as_uuid()])
            .await?;
        Ok(affected > 0)
    }

    async fn list_default_templates(&self, specialty: &str) -> Result<Vec<Template>> {
        let query = format!(
            "SELECT {} FROM templates
             WHERE specialty = $1 AND doctor_id IS NULL
             ORDER BY name",
            PostgreSQLTemplate::COLUMNS
        );
        self.client
            .query(&query, &[&specialty])
            .await?
            .iter()
            .map(|row| PostgreSQLTemplate::from_row(row)?.into_domain())
            .collect()
    }

    async fn list_doctor_templates(&self, doctor_id: &DoctorId) -> Result<Vec<Template>> {
        let query = format!(
            "SELECT {} FROM templates WHERE doctor_id = $1 ORDER BY created_at DESC",
            PostgreSQLTemplate::COLUMNS
        );
        self.client
            .query(&query, &[doctor_id.as_uuid()])
            .await?
            .iter()
            .map(|row| PostgreSQLTemplate::from_row(row)?.into_domain())
            .collect()
    }
}

#[async_trait]
impl PatientRepository for PostgreSQLAdapter {
    async fn get_patient(&self, id: &PatientId) -> Result<Option<Patient>> {
        let query = format!(
            "SELECT {} FROM patients WHERE id = $1",
            PostgreSQLPatient::COLUMNS
        );
        self.client
            .query_opt(&query, &[id.as_uuid()])
            .await?
            .map(|row| PostgreSQLPatient::from_row(&row)?.into_domain())
            .transpose()
    }

    async fn list_patients_by_doctor(&self, doctor_id: &DoctorId) -> Result<Vec<Patient>> {
        let query = format!(
            "SELECT {} FROM patients WHERE doctor_id = $1 ORDER BY created_at DESC",
            PostgreSQLPatient::COLUMNS
        );
        self.client
            .query(&query, &[doctor_id.as_uuid()])
            .await?
            .iter()
            .map(|row| PostgreSQLPatient::from_row(row)?.into_domain())
            .collect()
    }

    async fn create_patient_with_transcription(
        &self,
        patient: &Patient,
        transcription: Option<&Transcription>,
    ) -> Result<()> {
        let patient_row = PostgreSQLPatient::from_domain(patient)?;

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;

        tx.execute(
            "INSERT INTO patients (id, name, template_id, doctor_id, fields, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            &[
                &patient_row.id,
                &patient_row.name,
                &patient_row.template_id,
                &patient_row.doctor_id,
                &patient_row.fields,
                &patient_row.created_at,
                &patient_row.updated_at,
            ],
        )
        .await
        .map_err(|e| map_pg_error(e, "Failed to insert patient"))?;

        if let Some(transcription) = transcription {
            let row = PostgreSQLTranscription::from_domain(transcription);
            tx.execute(
                "INSERT INTO transcriptions (
                    id, doctor_id, patient_id, transcription_text,
                    extraction_result, audio_key, job_name, created_at
                 )
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &row.id,
                    &row.doctor_id,
                    &row.patient_id,
                    &row.transcription_text,
                    &row.extraction_result,
                    &row.audio_key,
                    &row.job_name,
                    &row.created_at,
                ],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to insert transcription"))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to commit transaction"))?;

        tracing::debug!(
            patient_id = %patient.id,
            with_transcription = transcription.is_some(),
            "Patient record committed"
        );
        Ok(())
    }
}

#[async_trait]
impl DoctorRepository for PostgreSQLAdapter {
    async fn insert_doctor(&self, doctor: &Doctor) -> Result<()> {
        let row = PostgreSQLDoctor::from_domain(doctor);
        self.client
            .execute(
                "INSERT INTO doctors (id, name, email, password_hash, hospital, role, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
                &[
                    &row.id,
                    &row.name,
                    &row.email,
                    &row.password_hash,
                    &row.hospital,
                    &row.role,
                    &row.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn get_doctor(&self, id: &DoctorId) -> Result<Option<Doctor>> {
        let query = format!(
            "SELECT {} FROM doctors WHERE id = $1",
            PostgreSQLDoctor::COLUMNS
        );
        self.client
            .query_opt(&query, &[id.as_uuid()])
            .await?
            .map(|row| PostgreSQLDoctor::from_row(&row)?.into_domain())
            .transpose()
    }

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>> {
        let query = format!(
            "SELECT {} FROM doctors WHERE email = $1",
            PostgreSQLDoctor::COLUMNS
        );
        let email = email.trim().to_lowercase();
        self.client
            .query_opt(&query, &[&email])
            .await?
            .map(|row| PostgreSQLDoctor::from_row(&row)?.into_domain())
            .transpose()
    }
}

#[async_trait]
impl TranscriptionRepository for PostgreSQLAdapter {
    async fn get_transcription(&self, id: &TranscriptionId) -> Result<Option<Transcription>> {
        let query = format!(
            "SELECT {} FROM transcriptions WHERE id = $1",
            PostgreSQLTranscription::COLUMNS
        );
        self.client
            .query_opt(&query, &[id.as_uuid()])
            .await?
            .map(|row| PostgreSQLTranscription::from_row(&row)?.into_domain())
            .transpose()
    }

    async fn list_transcriptions_by_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<Transcription>> {
        let query = format!(
            "SELECT {} FROM transcriptions WHERE patient_id = $1 ORDER BY created_at",
            PostgreSQLTranscription::COLUMNS
        );
        self.client
            .query(&query, &[patient_id.as_uuid()])
            .await?
            .iter()
            .map(|row| PostgreSQLTranscription::from_row(row)?.into_domain())
            .collect()
    }
}

#[async_trait]
impl Database for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}
