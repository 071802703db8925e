//! Core business logic module
//!
//! This module provides the core application layer including:
//! - Business logic services
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system

pub mod services;
pub mod config;
pub mod logging;
pub mod error;

pub use services::{AuthService, SweetService};
pub use config::Config;
pub use logging::Logger;
pub use error::{ShopError, ErrorResponse, Result};
