use axum::{http::StatusCode, response::Json};
use care_estimate::{EstimateError, ValidationError, WizardSession};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn bad_request_error(message: &str, field: Option<&str>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: message.to_string(),
            field: field.map(str::to_string),
        }),
    )
}

pub fn validation_error(err: ValidationError) -> ApiError {
    warn!(field = %err.field, message = %err.message, "Request rejected");
    bad_request_error(&err.message, Some(&err.field))
}

pub fn not_found_error(message: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: message.to_string(),
            field: None,
        }),
    )
}

/// The cause is logged and never sent to the client
pub fn internal_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: "Internal Server Error".to_string(),
            field: None,
        }),
    )
}

pub fn api_error(err: EstimateError) -> ApiError {
    match err {
        EstimateError::Validation(err) => validation_error(err),
        EstimateError::Wizard(message) => {
            warn!(message = %message, "Wizard step rejected");
            bad_request_error(&message, None)
        }
        EstimateError::SessionNotFound(id) => {
            warn!(session_id = %id, "Session not found");
            not_found_error("Session not found")
        }
        other => {
            error!(error = %other, "Request failed");
            internal_error()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WizardResponse {
    pub session_id: String,
    pub complete: bool,
    pub session: WizardSession,
}

impl From<WizardSession> for WizardResponse {
    fn from(session: WizardSession) -> Self {
        Self {
            session_id: session.id.clone(),
            complete: session.is_complete(),
            session,
        }
    }
}
