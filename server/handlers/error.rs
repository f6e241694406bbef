use serde_json::json;
use thiserror::Error;

use xray_diagnosis::accounts::AccountError;
use xray_diagnosis::db::DatabaseError;
use xray_diagnosis::diagnosis::PipelineError;
use xray_diagnosis::forms::FormErrors;
use xray_diagnosis::report::ReportError;

use crate::util::http::ApiResponse;

pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Everything a handler can fail with, mapped onto a status code and the
/// `{status: "error", ...}` envelope.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(FormErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed { allow: &'static str },

    #[error("{0}")]
    Conflict(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::Internal(_) => 500,
        }
    }

    pub fn into_response(self) -> ApiResponse {
        let status = self.status();
        match self {
            ApiError::Validation(errors) => {
                ApiResponse::json(status, json!({ "status": "error", "errors": errors }))
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "Internal error");
                ApiResponse::json(status, json!({ "status": "error", "message": INTERNAL_MESSAGE }))
            }
            ApiError::MethodNotAllowed { allow } => {
                ApiResponse::json(status, json!({ "status": "error", "message": "Method not allowed" }))
                    .with_header("Allow", allow)
            }
            other => ApiResponse::json(status, json!({ "status": "error", "message": other.to_string() })),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity_type, .. } => ApiError::NotFound(format!("{entity_type} not found")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Validation(errors) => ApiError::Validation(errors),
            AccountError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
            AccountError::Database(e) => e.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Database(e) if e.is_constraint() => {
                ApiError::Conflict("This image already has a diagnosis".into())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(e: ReportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
