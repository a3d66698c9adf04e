//! PostgreSQL row models
//!
//! Each model maps one table row and converts to and from the domain type.
//! Structured columns (`fields`, `extraction_result`) are stored as JSONB.

use crate::domain::ids::{DoctorId, JobName, PatientId, TemplateId, TranscriptionId};
use crate::domain::{
    Doctor, DoctorRole, Field, NextMedError, Patient, PatientFields, Result, Template,
    Transcription,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

/// Row of the `templates` table
#[derive(Debug, Clone)]
pub struct PostgreSQLTemplate {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub doctor_id: Option<Uuid>,
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLTemplate {
    pub const COLUMNS: &'static str = "id, name, specialty, doctor_id, fields, created_at, updated_at";

    /// Convert from the domain template
    pub fn from_domain(template: &Template) -> Result<Self> {
        Ok(Self {
            id: *template.id.as_uuid(),
            name: template.name.clone(),
            specialty: template.specialty.clone(),
            doctor_id: template.doctor_id.map(|d| *d.as_uuid()),
            fields: serde_json::to_value(&template.fields)?,
            created_at: template.created_at,
            updated_at: template.updated_at,
        })
    }

    /// Read a row selected with [`COLUMNS`](Self::COLUMNS)
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: get(row, "id")?,
            name: get(row, "name")?,
            specialty: get(row, "specialty")?,
            doctor_id: get(row, "doctor_id")?,
            fields: get(row, "fields")?,
            created_at: get(row, "created_at")?,
            updated_at: get(row, "updated_at")?,
        })
    }

    /// Convert to the domain template
    pub fn into_domain(self) -> Result<Template> {
        let fields: Vec<Field> = serde_json::from_value(self.fields)?;
        Ok(Template {
            id: TemplateId::from(self.id),
            name: self.name,
            specialty: self.specialty,
            doctor_id: self.doctor_id.map(DoctorId::from),
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row of the `patients` table
#[derive(Debug, Clone)]
pub struct PostgreSQLPatient {
    pub id: Uuid,
    pub name: String,
    pub template_id: Uuid,
    pub doctor_id: Uuid,
    pub fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostgreSQLPatient {
    pub const COLUMNS: &'static str =
        "id, name, template_id, doctor_id, fields, created_at, updated_at";

    pub fn from_domain(patient: &Patient) -> Result<Self> {
        Ok(Self {
            id: *patient.id.as_uuid(),
            name: patient.name.clone(),
            template_id: *patient.template_id.as_uuid(),
            doctor_id: *patient.doctor_id.as_uuid(),
            fields: serde_json::to_value(&patient.fields)?,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        })
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: get(row, "id")?,
            name: get(row, "name")?,
            template_id: get(row, "template_id")?,
            doctor_id: get(row, "doctor_id")?,
            fields: get(row, "fields")?,
            created_at: get(row, "created_at")?,
            updated_at: get(row, "updated_at")?,
        })
    }

    pub fn into_domain(self) -> Result<Patient> {
        let fields: PatientFields = serde_json::from_value(self.fields)?;
        Ok(Patient {
            id: PatientId::from(self.id),
            name: self.name,
            template_id: TemplateId::from(self.template_id),
            doctor_id: DoctorId::from(self.doctor_id),
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row of the `doctors` table
#[derive(Debug, Clone)]
pub struct PostgreSQLDoctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub hospital: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl PostgreSQLDoctor {
    pub const COLUMNS: &'static str = "id, name, email, password_hash, hospital, role, created_at";

    pub fn from_domain(doctor: &Doctor) -> Self {
        Self {
            id: *doctor.id.as_uuid(),
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            password_hash: doctor.password_hash.clone(),
            hospital: doctor.hospital.clone(),
            role: doctor.role.as_str().to_string(),
            created_at: doctor.created_at,
        }
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: get(row, "id")?,
            name: get(row, "name")?,
            email: get(row, "email")?,
            password_hash: get(row, "password_hash")?,
            hospital: get(row, "hospital")?,
            role: get(row, "role")?,
            created_at: get(row, "created_at")?,
        })
    }

    pub fn into_domain(self) -> Result<Doctor> {
        let role: DoctorRole = self.role.parse().map_err(NextMedError::Database)?;
        Ok(Doctor {
            id: DoctorId::from(self.id),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            hospital: self.hospital,
            role,
            created_at: self.created_at,
        })
    }
}

/// Row of the `transcriptions` table
#[derive(Debug, Clone)]
pub struct PostgreSQLTranscription {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub transcription_text: String,
    pub extraction_result: Value,
    pub audio_key: Option<String>,
    pub job_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PostgreSQLTranscription {
    pub const COLUMNS: &'static str = "id, doctor_id, patient_id, transcription_text, \
         extraction_result, audio_key, job_name, created_at";

    pub fn from_domain(transcription: &Transcription) -> Self {
        Self {
            id: *transcription.id.as_uuid(),
            doctor_id: *transcription.doctor_id.as_uuid(),
            patient_id: *transcription.patient_id.as_uuid(),
            transcription_text: transcription.transcription_text.clone(),
            extraction_result: transcription.extraction_result.clone(),
            audio_key: transcription.audio_key.clone(),
            job_name: transcription.job_name.as_ref().map(|j| j.to_string()),
            created_at: transcription.created_at,
        }
    }

    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: get(row, "id")?,
            doctor_id: get(row, "doctor_id")?,
            patient_id: get(row, "patient_id")?,
            transcription_text: get(row, "transcription_text")?,
            extraction_result: get(row, "extraction_result")?,
            audio_key: get(row, "audio_key")?,
            job_name: get(row, "job_name")?,
            created_at: get(row, "created_at")?,
        })
    }

    pub fn into_domain(self) -> Result<Transcription> {
        let job_name = self
            .job_name
            .map(JobName::new)
            .transpose()
            .map_err(NextMedError::Database)?;
        Ok(Transcription {
            id: TranscriptionId::from(self.id),
            doctor_id: DoctorId::from(self.doctor_id),
            patient_id: PatientId::from(self.patient_id),
            transcription_text: self.transcription_text,
            extraction_result: self.extraction_result,
            audio_key: self.audio_key,
            job_name,
            created_at: self.created_at,
        })
    }
}

fn get<'a, T>(row: &'a Row, column: &str) -> Result<T>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(column)
        .map_err(|e| NextMedError::Database(format!("Failed to read column {}: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldType, FieldValue};

    #[test]
    fn test_template_fields_roundtrip_through_json() {
        let template = Template::builder()
            .name("Gynecology Initial Visit")
            .specialty("Gynecology")
            .field(Field::new("Patient Age", FieldType::Number, true))
            .field(Field::new("Last Menstrual Period", FieldType::Date, false))
            .build()
            .unwrap();

        let row = PostgreSQLTemplate::from_domain(&template).unwrap();
        assert!(row.doctor_id.is_none());
        assert_eq!(row.fields[0]["fieldName"], "Patient Age");

        let back = row.into_domain().unwrap();
        assert_eq!(back.fields, template.fields);
        assert_eq!(back.id, template.id);
    }

    #[test]
    fn test_patient_missing_fields_stored_as_null() {
        let mut fields = PatientFields::new();
        fields.insert("Symptoms".to_string(), FieldValue::Present("cough".to_string()));
        fields.insert("Age".to_string(), FieldValue::Missing);
        let patient = Patient::new(None, TemplateId::new(), DoctorId::new(), fields);

        let row = PostgreSQLPatient::from_domain(&patient).unwrap();
        assert!(row.fields["Age"].is_null());
        assert_eq!(row.fields["Symptoms"], "cough");

        let back = row.into_domain().unwrap();
        assert_eq!(back.fields.get("Age"), Some(&FieldValue::Missing));
        assert_eq!(back.name, "Unknown");
    }

    #[test]
    fn test_doctor_role_roundtrip() {
        let doctor = Doctor::new("Dr. Ada", "ada@example.com", "hash", "General", DoctorRole::Admin);
        let row = PostgreSQLDoctor::from_domain(&doctor);
        assert_eq!(row.role, "admin");
        assert_eq!(row.into_domain().unwrap().role, DoctorRole::Admin);
    }

    #[test]
    fn test_transcription_job_name_restored() {
        let transcription = Transcription::new(
            DoctorId::new(),
            PatientId::new(),
            "Patient reports a cough",
            serde_json::json!({"Entities": []}),
        )
        .with_audio("uploads/1_note.mp3", JobName::new("transcription_1_abcd1234").unwrap());

        let row = PostgreSQLTranscription::from_domain(&transcription);
        let back = row.into_domain().unwrap();
        assert_eq!(back.job_name.unwrap().as_str(), "transcription_1_abcd1234");
        assert_eq!(back.audio_key.as_deref(), Some("uploads/1_note.mp3"));
    }
}
