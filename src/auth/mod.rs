//! Authentication module
//!
//! This module provides authentication functionality including:
//! - User registration and login
//! - JWT token generation and validation
//! - Password hashing and verification
//! - The route access policy and the middleware enforcing it

pub mod jwt;
pub mod password;
pub mod policy;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use jwt::{generate_token, validate_token, Claims};
pub use password::{hash_password, verify_password};
pub use policy::{required_access, Access};
pub use middleware::{access_gate, AuthUser};
pub use handlers::{register, login};
