//! Pipeline endpoints

use super::parse_id;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::core::ingestion::AudioUpload;
use crate::core::jobs::{PipelineJob, WaitOutcome};
use crate::core::pipeline::{PipelineOutcome, PipelineRequest, ProcessRequest};
use crate::domain::PipelineJobId;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// Multipart field carrying the recording
pub const AUDIO_FIELD: &str = "audio";

/// Message of a finished upload
pub const UPLOAD_COMPLETED_MESSAGE: &str = "Patient profile created successfully";

/// Message of a processed transcript
pub const PROCESS_COMPLETED_MESSAGE: &str = "Patient data processed and saved.";

/// Body of a finished pipeline run
#[derive(Debug, Serialize)]
pub struct PipelineResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub outcome: PipelineOutcome,
}

impl PipelineResponse {
    fn new(message: &'static str, outcome: PipelineOutcome) -> Self {
        Self { message, outcome }
    }
}

/// `POST /api/transcription/upload-audio`
///
/// Multipart fields: `audio` (file), `templateId`, `doctorId`. Answers 201
/// with the patient when the pipeline finishes within the configured wait,
/// otherwise 202 with the job so the client can poll
/// `GET /api/transcription/jobs/{id}`.
pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let mut upload: Option<AudioUpload> = None;
    let mut template_id = String::new();
    let mut doctor_id = String::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            AUDIO_FIELD => {
                let file_name = field.file_name().unwrap_or("audio").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                upload = Some(AudioUpload::new(file_name, content_type, bytes));
            }
            "templateId" => template_id = field.text().await?,
            "doctorId" => doctor_id = field.text().await?,
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    let upload = upload.ok_or_else(|| ApiError::validation("No file uploaded."))?;
    let handle = state
        .jobs
        .submit(PipelineRequest {
            upload,
            template_id,
            doctor_id,
        })
        .await?;

    match handle.wait(state.request_wait).await {
        WaitOutcome::Finished(result) => {
            let outcome = result?;
            Ok((StatusCode::CREATED, Json(PipelineResponse::new(UPLOAD_COMPLETED_MESSAGE, outcome))).into_response())
        }
        WaitOutcome::Pending(id) => {
            let job = state.jobs.get(&id).await?;
            Ok((StatusCode::ACCEPTED, Json(job)).into_response())
        }
    }
}

/// `POST /api/transcription/process`
pub async fn process(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> ApiResult<Json<PipelineResponse>> {
    let Json(request) = payload?;
    let outcome = state.coordinator.process_transcript(request).await?;
    Ok(Json(PipelineResponse::new(PROCESS_COMPLETED_MESSAGE, outcome)))
}

/// `GET /api/transcription/jobs/:id`
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PipelineJob>> {
    let id: PipelineJobId = parse_id(&id)?;
    Ok(Json(state.jobs.get(&id).await?))
}

/// `DELETE /api/transcription/jobs/:id`
///
/// Answers 202: the job stops at its next cancellation point.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<PipelineJob>)> {
    let id: PipelineJobId = parse_id(&id)?;
    let job = state.jobs.cancel(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}
