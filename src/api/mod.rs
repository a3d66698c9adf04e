//! HTTP surface
//!
//! Routes (JSON bodies are camelCase):
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/health` | [`handlers::health::check`] |
//! | POST | `/api/transcription/upload-audio` | [`handlers::transcription::upload_audio`] |
//! | POST | `/api/transcription/process` | [`handlers::transcription::process`] |
//! | GET, DELETE | `/api/transcription/jobs/:id` | job status, cancellation |
//! | POST | `/templates/default` | create a default template |
//! | POST | `/templates/customize/:templateId` | copy a template for a doctor |
//! | GET | `/templates/specialty/:specialty` | defaults of a specialty |
//! | GET | `/templates/my/:doctorId` | a doctor's templates |
//! | GET, PATCH, DELETE | `/templates/:templateId` | read, field edits, delete |
//! | GET | `/api/patients/:id` | patient with doctor and template |
//! | GET | `/api/patients/:id/transcriptions` | audit records of a patient |
//! | GET | `/api/patients/doctor/:doctorId` | a doctor's patients |
//! | GET | `/api/doctor/:id` | doctor without credentials |

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use state::AppState;

use crate::config::ServerConfig;
use crate::domain::{NextMedError, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use handlers::{doctors, health, patients, templates, transcription};
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for multipart framing on top of the audio payload
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the application router
///
/// # Errors
///
/// Returns `NextMedError::Configuration` if a CORS origin is not a valid
/// header value.
pub fn router(state: AppState, server: &ServerConfig) -> Result<Router> {
    let transcription_routes = Router::new()
        .route("/upload-audio", post(transcription::upload_audio))
        .route("/process", post(transcription::process))
        .route(
            "/jobs/:id",
            get(transcription::job_status).delete(transcription::cancel_job),
        );

    let template_routes = Router::new()
        .route("/default", post(templates::create_default))
        .route("/customize/:template_id", post(templates::customize))
        .route("/specialty/:specialty", get(templates::by_specialty))
        .route("/my/:doctor_id", get(templates::for_doctor))
        .route(
            "/:template_id",
            get(templates::get_template)
                .patch(templates::update_template)
                .delete(templates::delete_template),
        );

    let patient_routes = Router::new()
        .route("/:id", get(patients::get_patient))
        .route("/:id/transcriptions", get(patients::transcriptions))
        .route("/doctor/:doctor_id", get(patients::list_for_doctor));

    Ok(Router::new()
        .route("/health", get(health::check))
        .nest("/api/transcription", transcription_routes)
        .nest("/api/patients", patient_routes)
        .route("/api/doctor/:id", get(doctors::get_doctor))
        .nest("/templates", template_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&server.cors_allowed_origins)?)
                .layer(DefaultBodyLimit::max(
                    server.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES,
                )),
        ))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                NextMedError::Configuration(format!("Invalid CORS origin '{origin}': {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Serve until `shutdown` flips to `true`
///
/// Outstanding pipeline jobs are cancelled once the signal arrives, then
/// in-flight requests are drained.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(
    state: AppState,
    server: &ServerConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let app = router(state.clone(), server)?;
    let listener = tokio::net::TcpListener::bind(&server.bind_address)
        .await
        .map_err(|e| {
            NextMedError::Configuration(format!(
                "Failed to bind {}: {}",
                server.bind_address, e
            ))
        })?;
    tracing::info!(address = %server.bind_address, "HTTP server listening");

    let pruner = spawn_job_pruner(
        state.clone(),
        Duration::from_secs(server.job_retention_minutes * 60),
    );

    let jobs = state.jobs.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            tracing::info!("Shutdown requested, cancelling pipeline jobs");
            jobs.cancel_all().await;
        })
        .await?;

    pruner.abort();
    tracing::info!("HTTP server stopped");
    Ok(())
}

fn spawn_job_pruner(state: AppState, retention: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(retention.min(Duration::from_secs(60)));
        loop {
            interval.tick().await;
            state.jobs.prune_finished(retention).await;
        }
    })
}
