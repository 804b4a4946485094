// Typed request errors and their HTTP mapping

use axum::{http::StatusCode, response::{IntoResponse, Response}};
use serde_json::json;
use thiserror::Error;

use crate::database::RepositoryError;
use crate::utils::response_handler::HandlerResponse;

/// Every request-scoped failure a handler or interceptor can produce
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            RepositoryError::Database(e) => ApiError::Internal(e.into()),
            RepositoryError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message: String = match &self {
            ApiError::Internal(e) => {
                // ! Details are logged, never returned
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HandlerResponse::new(self.status_code())
            .data(json!({ "error": self.kind() }))
            .message(message)
            .into_response()
    }
}

pub type ApiResult<T = HandlerResponse> = Result<T, ApiError>;
