//! Notes subsystem.
//!
//! # Data Flow
//! ```text
//! upload_note(identity, body)
//!     → identity required → rate_limit(createNote, identity) → store.insert_note
//!
//! delete_note(identity, note_id)
//!     → identity required → store.get_note → owner check → store.delete_note
//!     → NotFound if a concurrent delete got there first
//!
//! get_notes()
//!     → store.scan_notes → concurrent store.get_user per note → NoteView list
//! ```
//!
//! # Design Decisions
//! - Identity is an explicit argument, resolved by the caller
//! - Collaborators are injected as trait objects at startup
//! - Errors propagate unchanged; no retries

pub mod error;
pub mod service;
pub mod types;

pub use error::{NotesError, NotesResult};
pub use service::NotesService;
pub use types::{NewNote, Note, NoteId, NoteView, User, UserId};
