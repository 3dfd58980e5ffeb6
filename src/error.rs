//! Error types shared by repositories and handlers.
//!
//! Every failure leaving a handler is rendered as `{"erro": "<message>"}`
//! with a status matching its class. Internal causes are logged and never
//! echoed back to the client.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("resource not found")]
    NotFound,
    /// The row exists but belongs to a different author.
    #[error("resource owned by another user")]
    NotOwner,
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepoError {
    /// Maps constraint violations to their domain meaning.
    pub fn from_db(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return RepoError::Conflict("nick or email already in use".into());
            }
            if db.is_foreign_key_violation() {
                return RepoError::NotFound;
            }
        }
        RepoError::Database(err)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub erro: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(cause) = &self {
            error!(error = %cause, "request failed");
        }
        let status = self.status();
        (
            status,
            Json(ErrorBody {
                erro: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => ApiError::NotFound("resource not found".into()),
            RepoError::NotOwner => {
                ApiError::Forbidden("cannot modify another author's resource".into())
            }
            RepoError::Conflict(msg) => ApiError::Conflict(msg),
            RepoError::Database(e) => ApiError::internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
