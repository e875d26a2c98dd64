//! Notes backend: authenticated upload and delete, public listing.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod notes;
pub mod observability;
pub mod security;
pub mod store;

pub use config::schema::NotesConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use notes::{NotesError, NotesService};
