//! Sweet Shop Backend Library
//!
//! This library provides the core functionality for the sweet shop backend:
//! account registration and login with signed session tokens, a role-gated
//! inventory API, and SQLite-backed storage.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::ApiServer;
pub use crate::core::{Config, ShopError};
pub use db::DatabaseManager;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
