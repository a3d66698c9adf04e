//! Patient endpoints

use super::parse_id;
use crate::adapters::database::{
    DoctorRepository, PatientRepository, TemplateRepository, TranscriptionRepository,
};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::domain::{Doctor, DoctorId, NextMedError, Patient, PatientId, Template, Transcription};
use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;

/// A patient with its doctor and template
///
/// Either may be `null`: templates can be deleted while patients keep
/// referencing them.
#[derive(Debug, Serialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    pub doctor: Option<Doctor>,
    pub template: Option<Template>,
}

/// `GET /api/patients/:id`
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PatientDetail>> {
    let id: PatientId = parse_id(&id)?;
    let patient = state
        .database
        .get_patient(&id)
        .await?
        .ok_or_else(|| NextMedError::NotFound("Patient not found".to_string()))?;

    let doctor = state.database.get_doctor(&patient.doctor_id).await?;
    let template = state.database.get_template(&patient.template_id).await?;
    if template.is_none() {
        tracing::debug!(
            patient_id = %patient.id,
            template_id = %patient.template_id,
            "Patient references a deleted template"
        );
    }

    Ok(Json(PatientDetail {
        patient,
        doctor,
        template,
    }))
}

/// `GET /api/patients/doctor/:doctorId`
pub async fn list_for_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> ApiResult<Json<Vec<Patient>>> {
    let doctor_id: DoctorId = parse_id(&doctor_id)?;
    Ok(Json(state.database.list_patients_by_doctor(&doctor_id).await?))
}

/// `GET /api/patients/:id/transcriptions`
pub async fn transcriptions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Transcription>>> {
    let id: PatientId = parse_id(&id)?;
    Ok(Json(state.database.list_transcriptions_by_patient(&id).await?))
}
