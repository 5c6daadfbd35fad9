use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::appointments::repo_types::AppointmentStatus;

const INTERNAL_SERVER_ERROR_MESSAGE: &str = "internal server error";

/// Failure reported by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("record already exists")]
    Duplicate,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.into())
    }
}

/// Every failure a use-case can hand back to its caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The record exists but belongs to another user.
    #[error("access to {0} denied")]
    Forbidden(&'static str),

    #[error("appointment cannot change state from {current}")]
    InvalidStateTransition { current: AppointmentStatus },

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("{0}")]
    Conflict(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),

    /// Hashing, signing and other failures outside the stores.
    #[error("internal failure: {0}")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn invalid(field: impl Into<String>) -> Self {
        AppError::InvalidInput(field.into())
    }

    /// Maps a store failure, naming the entity a missing row refers to.
    pub fn from_store(entity: &'static str) -> impl Fn(StoreError) -> AppError {
        move |e| match e {
            StoreError::NotFound => AppError::NotFound(entity),
            StoreError::Duplicate => AppError::Conflict(format!("{entity} already exists")),
            StoreError::Backend(e) => AppError::Persistence(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NotFound(entity) | AppError::Forbidden(entity) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            AppError::InvalidStateTransition { .. } | AppError::Conflict(_) => {
                (StatusCode::CONFLICT, self.to_string())
            }
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "invalid or expired token".to_string(),
            ),
            AppError::Persistence(e) => {
                tracing::error!(error = ?e, "persistence failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
