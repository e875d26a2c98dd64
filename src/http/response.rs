//! Mapping of note errors onto HTTP responses.
//!
//! | Error | Status |
//! |---|---|
//! | `Unauthorized` | 401 (+ `WWW-Authenticate: Bearer`) |
//! | `NotFound` | 404 |
//! | `RateLimited` | 429 (+ `Retry-After`, whole seconds rounded up) |
//! | `Store` / `Auth` | 503 |
//! | `RateLimiter` | 500 |
//!
//! Bodies are `{"error": "<message>"}`, including for requests axum rejects
//! before a handler runs (bad note id, malformed JSON body).

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::AuthError;
use crate::notes::NotesError;

/// JSON error payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Seconds to advertise in `Retry-After`.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)
}

impl NotesError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NotesError::Unauthorized => StatusCode::UNAUTHORIZED,
            NotesError::NotFound(_) => StatusCode::NOT_FOUND,
            NotesError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            NotesError::Store(_) | NotesError::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
            NotesError::RateLimiter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NotesError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let mut response = (status, Json(ErrorBody { error: self.to_string() })).into_response();
        let headers = response.headers_mut();
        match &self {
            NotesError::Unauthorized => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            NotesError::RateLimited { retry_after, .. } => {
                headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs(*retry_after)));
            }
            _ => {}
        }
        response
    }
}

/// Failure of a note endpoint.
#[derive(Debug)]
pub enum HttpError {
    /// The request never reached the notes service.
    Rejected { status: StatusCode, message: String },
    Notes(NotesError),
}

impl From<NotesError> for HttpError {
    fn from(err: NotesError) -> Self {
        HttpError::Notes(err)
    }
}

impl From<AuthError> for HttpError {
    fn from(err: AuthError) -> Self {
        HttpError::Notes(err.into())
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        HttpError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::Rejected { status, message } => {
                tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
                (status, Json(ErrorBody { error: message })).into_response()
            }
            HttpError::Notes(err) => err.into_response(),
        }
    }
}
