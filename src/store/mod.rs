//! Document storage subsystem.
//!
//! # Data Flow
//! ```text
//! NotesService
//!     → DocumentStore (insert / get / delete / scan)
//!     → backend (memory.rs: DashMap + insertion sequence)
//! ```
//!
//! # Design Decisions
//! - The service only sees the trait; backends are injected at startup
//! - Keys are assigned by the store, never by callers
//! - Scans return documents in insertion order

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::notes::types::{NewNote, Note, NoteId, User, UserId};

pub use memory::MemoryStore;

/// Errors raised by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-addressed `notes` and `users` collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a note and return its new key.
    async fn insert_note(&self, note: NewNote) -> StoreResult<NoteId>;

    /// Point lookup. `Ok(None)` when the key is unknown.
    async fn get_note(&self, id: &NoteId) -> StoreResult<Option<Note>>;

    /// Remove a note. Returns `false` when the key was already gone, so two
    /// racing deletes cannot both observe a removal.
    async fn delete_note(&self, id: &NoteId) -> StoreResult<bool>;

    /// Every note, in insertion order.
    async fn scan_notes(&self) -> StoreResult<Vec<Note>>;

    /// Point lookup in the `users` collection.
    async fn get_user(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Create or replace a user profile.
    async fn put_user(&self, user: User) -> StoreResult<()>;
}
