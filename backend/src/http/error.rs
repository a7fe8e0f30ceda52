//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::repository::RepositoryError;
use crate::services::generator::GenerationError;
use crate::services::publish::PublishError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Repository error
    Repository(RepositoryError),
    /// Rejected calendar generation
    Generation(GenerationError),
    /// Rejected draft promotion
    Publish(PublishError),
}

fn repository_response(err: RepositoryError) -> (StatusCode, ApiError) {
    let msg = err.to_string();
    match err {
        RepositoryError::NotFound { .. } => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
        RepositoryError::ValidationError { .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", msg),
        ),
        RepositoryError::TransactionError { .. } => (
            StatusCode::CONFLICT,
            ApiError::new("TRANSACTION_CONFLICT", msg),
        ),
        RepositoryError::ConfigurationError { .. } | RepositoryError::InternalError { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("REPOSITORY_ERROR", msg),
        ),
    }
}

fn generation_response(err: GenerationError) -> (StatusCode, ApiError) {
    let code = err.code();
    let msg = err.to_string();
    match err {
        GenerationError::Repository(e) => repository_response(e),
        GenerationError::TemplateNotFound(_) => (StatusCode::NOT_FOUND, ApiError::new(code, msg)),
        GenerationError::Collisions { collisions, .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new(code, msg).with_details(json!({ "collisions": collisions })),
        ),
        GenerationError::MissingResource {
            slot_id,
            date,
            fields,
        } => (
            StatusCode::BAD_REQUEST,
            ApiError::new(code, msg).with_details(json!({
                "slot_id": slot_id,
                "date": date,
                "fields": fields,
            })),
        ),
        GenerationError::InvalidDuration {
            slot_id,
            date,
            duration_minutes,
        } => (
            StatusCode::BAD_REQUEST,
            ApiError::new(code, msg).with_details(json!({
                "slot_id": slot_id,
                "date": date,
                "duration_minutes": duration_minutes,
            })),
        ),
        GenerationError::InvalidRange { .. }
        | GenerationError::RangeTooWide { .. }
        | GenerationError::NoActiveTemplate => {
            (StatusCode::BAD_REQUEST, ApiError::new(code, msg))
        }
    }
}

fn publish_response(err: PublishError) -> (StatusCode, ApiError) {
    let code = err.code();
    let msg = err.to_string();
    match err {
        PublishError::Repository(e) => repository_response(e),
        PublishError::Rejected { errors: records } | PublishError::MissingFields { records } => (
            StatusCode::BAD_REQUEST,
            ApiError::new(code, msg).with_details(json!({ "records": records })),
        ),
        PublishError::EmptyName | PublishError::EmptyDraft => {
            (StatusCode::BAD_REQUEST, ApiError::new(code, msg))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Repository(e) => repository_response(e),
            AppError::Generation(e) => generation_response(e),
            AppError::Publish(e) => publish_response(e),
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        AppError::Generation(err)
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        AppError::Publish(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
