//! Template endpoints

use super::parse_id;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::core::templates::{EditOutcome, FieldEdit, NewTemplate};
use crate::domain::{DoctorId, Field, FieldType, Template, TemplateId};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

/// Body of `POST /templates/customize/:templateId`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizeRequest {
    #[serde(default)]
    pub doctor_id: String,
    #[serde(default)]
    pub modifications: Option<Modifications>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Modifications {
    #[serde(default)]
    pub fields: Option<Vec<Field>>,
}

/// One entry of a field edit request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEditRequest {
    pub action: String,
    pub field_name: String,
    #[serde(default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

impl TryFrom<FieldEditRequest> for FieldEdit {
    type Error = ApiError;

    fn try_from(req: FieldEditRequest) -> Result<Self, Self::Error> {
        match req.action.to_lowercase().as_str() {
            "add" => {
                let field_type = req.field_type.ok_or_else(|| {
                    ApiError::validation(format!(
                        "fieldType is required to add field '{}'",
                        req.field_name
                    ))
                })?;
                Ok(FieldEdit::Add(Field {
                    field_name: req.field_name,
                    field_type,
                    required: req.required,
                    options: req.options,
                }))
            }
            "remove" => Ok(FieldEdit::Remove {
                field_name: req.field_name,
            }),
            other => Err(ApiError::validation(format!(
                "Unknown field edit action '{other}'. Must be one of: add, remove"
            ))),
        }
    }
}

/// Body of `PATCH /templates/:templateId`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    pub fields: Vec<FieldEditRequest>,
    #[serde(default)]
    pub doctor_id: Option<String>,
}

/// `POST /templates/default`
pub async fn create_default(
    State(state): State<AppState>,
    payload: Result<Json<NewTemplate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let Json(new) = payload?;
    let template = state.templates.create_default(new).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// `POST /templates/customize/:templateId`
pub async fn customize(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    payload: Result<Json<CustomizeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let Json(request) = payload?;
    let template_id: TemplateId = parse_id(&template_id)?;
    let doctor_id: DoctorId = parse_id(&request.doctor_id)?;
    let overrides = request.modifications.unwrap_or_default().fields;

    let template = state
        .templates
        .customize(&template_id, doctor_id, overrides)
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// `GET /templates/specialty/:specialty`
pub async fn by_specialty(
    State(state): State<AppState>,
    Path(specialty): Path<String>,
) -> ApiResult<Json<Vec<Template>>> {
    Ok(Json(
        state.templates.list_defaults_by_specialty(&specialty).await?,
    ))
}

/// `GET /templates/my/:doctorId`
pub async fn for_doctor(
    State(state): State<AppState>,
    Path(doctor_id): Path<String>,
) -> ApiResult<Json<Vec<Template>>> {
    let doctor_id: DoctorId = parse_id(&doctor_id)?;
    Ok(Json(state.templates.list_for_doctor(&doctor_id).await?))
}

/// `GET /templates/:templateId`
pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> ApiResult<Json<Template>> {
    let template_id: TemplateId = parse_id(&template_id)?;
    Ok(Json(state.templates.get(&template_id).await?))
}

/// `PATCH /templates/:templateId`
///
/// 200 when edited in place, 201 when forked for the given doctor.
pub async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
    payload: Result<Json<UpdateTemplateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let Json(request) = payload?;
    let template_id: TemplateId = parse_id(&template_id)?;
    let doctor_id = request
        .doctor_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .map(parse_id::<DoctorId>)
        .transpose()?;
    let edits = request
        .fields
        .into_iter()
        .map(FieldEdit::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let outcome = state
        .templates
        .apply_field_edits(&template_id, &edits, doctor_id)
        .await?;
    let status = match outcome {
        EditOutcome::Updated(_) => StatusCode::OK,
        EditOutcome::Forked(_) => StatusCode::CREATED,
    };
    Ok((status, Json(outcome.into_template())))
}

/// `DELETE /templates/:templateId`
pub async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<String>,
) -> ApiResult<StatusCode> {
    let template_id: TemplateId = parse_id(&template_id)?;
    state.templates.delete(&template_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
