//! Liveness and readiness

use crate::adapters::database::Database;
use crate::api::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub active_jobs: usize,
}

/// `GET /health`
///
/// Answers 503 when the database does not respond.
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = match state.database.test_connection().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unavailable");
            false
        }
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = HealthResponse {
        status: if database_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: state.database.backend_name(),
        active_jobs: state.jobs.active_count().await,
    };
    (status, Json(body))
}
