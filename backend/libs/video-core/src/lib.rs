//! Video library core models and types
//!
//! Shared data structures for library-service and the collaborators that
//! feed it (ingestion, user management).

pub mod constants;
pub mod models;

pub use models::*;
