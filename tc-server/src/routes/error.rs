use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tc_core::RepositoryError;
use tc_core::submission::{DeliveryError, RenderError, SubmissionError};
use tc_core::template::TemplateError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// A collaborator is missing credentials or is not installed.
    #[error("{0}")]
    Unavailable(String),

    /// A collaborator was reached but failed.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

/// Body shared by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Invalid request",
            ApiError::NotFound(_) => "Not found",
            ApiError::Unavailable(_) => "Service not configured",
            ApiError::Upstream(_) => "Upstream service failed",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }

        let body = ErrorResponse {
            success: false,
            message: self.summary().to_string(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ApiError::NotFound(e.to_string()),
            RepositoryError::Configuration(_) => ApiError::Unavailable(e.to_string()),
            RepositoryError::Connection(_) | RepositoryError::Database(_) => {
                ApiError::Upstream(e.to_string())
            }
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::UnknownRole(_) => ApiError::BadRequest(e.to_string()),
            TemplateError::NotFound { .. }
            | TemplateError::Io { .. }
            | TemplateError::Render(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Template(e) => e.into(),
            SubmissionError::Repository(e) => e.into(),
            SubmissionError::Render(e @ RenderError::Unavailable(_)) => {
                ApiError::Unavailable(e.to_string())
            }
            SubmissionError::Render(e) => ApiError::Upstream(e.to_string()),
            SubmissionError::Delivery(e @ DeliveryError::Configuration(_)) => {
                ApiError::Unavailable(e.to_string())
            }
            SubmissionError::Delivery(e @ DeliveryError::InvalidMessage(_)) => {
                ApiError::BadRequest(e.to_string())
            }
            SubmissionError::Delivery(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            ApiError::from(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TemplateError::UnknownRole("X".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SubmissionError::from(DeliveryError::Configuration("x".to_string())))
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(SubmissionError::from(RenderError::Failed("x".to_string()))).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn message_is_summary_and_error_is_detail() {
        let err = ApiError::NotFound("Transaction not found".to_string());
        assert_eq!(err.summary(), "Not found");
        assert_eq!(err.to_string(), "Transaction not found");
    }
}
