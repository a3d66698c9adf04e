//! Doctor endpoints

use super::parse_id;
use crate::api::error::ApiResult;
use crate::adapters::database::DoctorRepository;
use crate::api::state::AppState;
use crate::domain::{Doctor, DoctorId, NextMedError};
use axum::extract::{Path, State};
use axum::response::Json;

/// `GET /api/doctor/:id`
///
/// The password hash is never part of the response.
pub async fn get_doctor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Doctor>> {
    let id: DoctorId = parse_id(&id)?;
    let doctor = state
        .database
        .get_doctor(&id)
        .await?
        .ok_or_else(|| NextMedError::NotFound("Doctor not found".to_string()))?;
    Ok(Json(doctor))
}
