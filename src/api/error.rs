//! HTTP rendering of canonical errors
//!
//! Handlers return `ApiResult<T>`; a failure becomes
//! `{"code": <status>, "message": <text>}` with the mapped status.

use axum::{
    Json,
    extract::OriginalUri,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, Kind};

pub type ApiResult<T> = Result<T, Error>;

/// Wire payload for every HTTP error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

pub fn status_for(kind: Kind) -> StatusCode {
    match kind {
        Kind::NotFound => StatusCode::NOT_FOUND,
        Kind::BadRequest => StatusCode::BAD_REQUEST,
        Kind::Unauthorized => StatusCode::UNAUTHORIZED,
        Kind::Forbidden => StatusCode::FORBIDDEN,
        Kind::AlreadyExists | Kind::Conflict => StatusCode::CONFLICT,
        Kind::Timeout => StatusCode::REQUEST_TIMEOUT,
        Kind::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
        Kind::Internal | Kind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Inverse of [`status_for`]. 409 is ambiguous and reads back as `Conflict`;
/// 500 reads back as `Internal`.
pub fn kind_for_status(status: StatusCode) -> Kind {
    match status {
        StatusCode::NOT_FOUND => Kind::NotFound,
        StatusCode::BAD_REQUEST => Kind::BadRequest,
        StatusCode::UNAUTHORIZED => Kind::Unauthorized,
        StatusCode::FORBIDDEN => Kind::Forbidden,
        StatusCode::CONFLICT => Kind::Conflict,
        StatusCode::REQUEST_TIMEOUT => Kind::Timeout,
        StatusCode::TOO_MANY_REQUESTS => Kind::TooManyRequests,
        StatusCode::INTERNAL_SERVER_ERROR => Kind::Internal,
        _ => Kind::Unknown,
    }
}

impl ErrorBody {
    pub fn from_error(err: &Error) -> Self {
        let status = status_for(err.kind);
        let message = if err.message.is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            err.message.clone()
        };
        Self {
            code: status.as_u16(),
            message,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(self.kind);
        if status.is_server_error() {
            tracing::error!("Unhandled error: {}", self);
        } else {
            tracing::warn!("HTTP error {}: {}", status.as_u16(), self);
        }
        (status, Json(ErrorBody::from_error(&self))).into_response()
    }
}

/// Fallback for unmatched routes.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> Error {
    Error::new(Kind::NotFound, format!("no route for {}", uri.path()))
}
