//! HTTP error mapping

use crate::domain::NextMedError;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Unique id, also written to the log
    pub error_id: String,
    pub error_type: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A request failure, rendered as [`ApiErrorResponse`]
#[derive(Debug)]
pub struct ApiError(pub NextMedError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(NextMedError::Validation(message.into()))
    }

    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            NextMedError::Validation(_) => StatusCode::BAD_REQUEST,
            NextMedError::NotFound(_) => StatusCode::NOT_FOUND,
            NextMedError::Conflict(_) => StatusCode::CONFLICT,
            NextMedError::External(_) | NextMedError::TranscriptFormat(_) => {
                StatusCode::BAD_GATEWAY
            }
            NextMedError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            NextMedError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller
    ///
    /// Client errors carry the bare message. Internal failures are replaced
    /// with a generic text; the detail stays in the log under the error id.
    fn public_message(&self) -> String {
        match &self.0 {
            NextMedError::Validation(m)
            | NextMedError::NotFound(m)
            | NextMedError::Conflict(m)
            | NextMedError::TranscriptFormat(m)
            | NextMedError::Timeout(m)
            | NextMedError::Cancelled(m) => m.clone(),
            NextMedError::External(e) => e.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<NextMedError> for ApiError {
    fn from(err: NextMedError) -> Self {
        Self(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::validation(format!("Malformed multipart body: {}", err.body_text()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_type = self.0.kind(),
                error = %self.0,
                "Request failed"
            );
        } else {
            tracing::debug!(
                error_id = %error_id,
                error_type = self.0.kind(),
                error = %self.0,
                "Request rejected"
            );
        }

        let body = ApiErrorResponse {
            error_id,
            error_type: self.0.kind().to_string(),
            message: self.public_message(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result alias for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExternalServiceError;
    use test_case::test_case;

    #[test_case(NextMedError::Validation("x".into()) => StatusCode::BAD_REQUEST)]
    #[test_case(NextMedError::NotFound("x".into()) => StatusCode::NOT_FOUND)]
    #[test_case(NextMedError::Conflict("x".into()) => StatusCode::CONFLICT)]
    #[test_case(NextMedError::External(ExternalServiceError::UploadFailed("x".into())) => StatusCode::BAD_GATEWAY)]
    #[test_case(NextMedError::TranscriptFormat("x".into()) => StatusCode::BAD_GATEWAY)]
    #[test_case(NextMedError::Timeout("x".into()) => StatusCode::GATEWAY_TIMEOUT)]
    #[test_case(NextMedError::Cancelled("x".into()) => StatusCode::SERVICE_UNAVAILABLE)]
    #[test_case(NextMedError::Database("x".into()) => StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status_mapping(err: NextMedError) -> StatusCode {
        ApiError(err).status_code()
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError(NextMedError::Database("password=hunter2".into()));
        assert_eq!(err.public_message(), "Internal server error");

        let err = ApiError(NextMedError::Validation("Missing required fields.".into()));
        assert_eq!(err.public_message(), "Missing required fields.");
    }
}
