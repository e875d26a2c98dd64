//! Identity resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request headers
//!     → AuthProvider::resolve_identity
//!     → Some(UserId) | None
//!     → passed explicitly into NotesService operations
//! ```
//!
//! # Design Decisions
//! - Handlers never read identity from ambient state
//! - An unknown or malformed credential resolves to "no identity"; the
//!   operation decides whether that is an error
//! - Provider failures are distinct from absence and propagate unchanged

pub mod token;

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::notes::types::UserId;

pub use token::TokenAuthProvider;

/// Failure of the identity backend itself.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Resolves the caller of a request.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn resolve_identity(&self, headers: &HeaderMap) -> Result<Option<UserId>, AuthError>;
}
