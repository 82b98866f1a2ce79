//! Library Service
//!
//! Role-gated video library: listing, detail, delete, and byte-range
//! streaming of stored videos with per-quality renditions.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
