//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kestrel_repository::RepositoryError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Server error type, mapped onto HTTP statuses by `IntoResponse`.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ServerError::Internal(err) => {
                error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<crate::service::ServiceError> for ServerError {
    fn from(err: crate::service::ServiceError) -> Self {
        match err {
            crate::service::ServiceError::Invalid(msg) => ServerError::BadRequest(msg),
            crate::service::ServiceError::NotReady(msg) => ServerError::ServiceUnavailable(msg),
        }
    }
}

impl From<RepositoryError> for ServerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServerError::NotFound("record not found".to_string()),
            RepositoryError::TenantRequired => {
                ServerError::BadRequest("tenant id is required".to_string())
            }
            other => ServerError::Internal(other.into()),
        }
    }
}
