//! Errors surfaced by note operations.

use std::time::Duration;
use thiserror::Error;

use crate::auth::AuthError;
use crate::notes::types::NoteId;
use crate::security::RateLimitError;
use crate::store::StoreError;

/// Every way a note operation can fail. Nothing is retried or recovered
/// locally; a failed operation has no persisted effect.
#[derive(Debug, Error)]
pub enum NotesError {
    /// No identity, or the identity does not own the note.
    #[error("Unauthorized")]
    Unauthorized,

    /// The note does not exist (or was already deleted).
    #[error("Note not found: {0}")]
    NotFound(NoteId),

    /// The caller exhausted its quota under `policy`.
    #[error("Rate limit `{policy}` exceeded, retry after {retry_after:?}")]
    RateLimited { policy: String, retry_after: Duration },

    /// The limiter rejected the request for a reason other than quota.
    #[error(transparent)]
    RateLimiter(RateLimitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<RateLimitError> for NotesError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exhausted { policy, retry_after } => {
                NotesError::RateLimited { policy, retry_after }
            }
            other => NotesError::RateLimiter(other),
        }
    }
}

pub type NotesResult<T> = Result<T, NotesError>;
