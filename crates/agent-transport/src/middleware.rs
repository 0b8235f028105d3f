//! HTTP error adaptation: turns the unified [`AgentError`] into an axum
//! response with the right status code and the `{kind, message}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::runtime::AgentError;
use crate::types::ApiError;

/// Wraps an [`AgentError`] with the HTTP status it should be reported as.
pub struct AppError {
    pub code: StatusCode,
    pub error: ApiError,
}

impl AppError {
    pub fn new(code: StatusCode, error: ApiError) -> Self {
        Self { code, error }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NotFound", message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiError::new("BadRequest", message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiError::new("Internal", message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.code, Json(self.error)).into_response()
    }
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        let code = status_for_kind(&err.kind);
        tracing::error!(kind = %err.kind, message = %err.message, "request failed");
        let mut api_error = ApiError::new(err.kind, err.message);
        if let Some(cause) = err.cause {
            api_error = api_error.with_cause(cause);
        }
        Self::new(code, api_error)
    }
}

/// Maps a stable error kind to the HTTP status a caller should see.
fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "OperationNotFound" | "SkillMissingRequired" | "TargetUnknown" => StatusCode::NOT_FOUND,
        "InvalidArgument" | "TemplateInvalid" | "ConfigSchemaViolation" => StatusCode::BAD_REQUEST,
        "Unauthorized" => StatusCode::UNAUTHORIZED,
        "WriteForbidden" | "PermissionDenied" => StatusCode::FORBIDDEN,
        "CircuitOpen" | "SkillUnavailable" | "Reloading" | "ShuttingDown" | "DependencyNotReady" => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        "Timeout" | "StepTimeout" => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
