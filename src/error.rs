use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{
    auth::{IssueError, UnknownRole},
    repository::RepositoryError,
    sequence::SequenceError,
};

/// ApiError
///
/// Everything a handler can fail with. Each variant maps to one status code;
/// internal causes are logged and never echoed to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already exists")]
    UsernameTaken,
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
    #[error("could not allocate an identifier")]
    Sequence(#[from] SequenceError),
    #[error("could not issue a token")]
    Token(#[from] IssueError),
    #[error("storage failure")]
    Storage(#[source] RepositoryError),
    #[error("password hashing failed")]
    PasswordHash,
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::UsernameTaken => ApiError::UsernameTaken,
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::UnknownRole(_) => (StatusCode::BAD_REQUEST, "invalid_role"),
            ApiError::UsernameTaken => (StatusCode::BAD_REQUEST, "username_taken"),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            ApiError::Sequence(_)
            | ApiError::Token(_)
            | ApiError::Storage(_)
            | ApiError::PasswordHash => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        json_error(status, code, self.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
