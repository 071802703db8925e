//! Database module
//!
//! This module provides database management functionality including:
//! - Database connection pool management
//! - Repository pattern implementations
//! - Database migrations
//! - Data models and schemas

pub mod manager;
pub mod models;
pub mod repository;
pub mod migrations;

pub use manager::DatabaseManager;
pub use models::{Role, Sweet, SweetDraft, User, MAX_QUANTITY};
pub use repository::{
    NewUser, PurchaseOutcome, Repository, RestockOutcome, SweetRepository, UserRepository,
};
