//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Authenticated mutation:
//!     → auth (resolve identity)
//!     → rate_limit.rs (consume one unit of the named policy for that identity)
//!     → NotesService writes
//! ```
//!
//! # Design Decisions
//! - Fail closed: an exhausted or unknown policy rejects the request
//! - Limits are keyed per identity, never per IP
//! - One limiter instance per process, built from config at startup

pub mod rate_limit;

pub use rate_limit::{PolicyRateLimiter, RateLimitError, RateLimiter};
