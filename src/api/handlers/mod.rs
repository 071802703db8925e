pub mod sweets;
pub mod system;

pub use sweets::*;
pub use system::*;

use crate::core::config::SecurityConfig;
use crate::core::services::{AuthService, SweetService};
use crate::db::manager::DatabaseManager;
use crate::db::repository::{SweetRepository, UserRepository};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub sweet_service: Arc<SweetService>,
    pub db: Arc<DatabaseManager>,
    pub jwt_secret: Arc<String>,
}

impl AppState {
    /// Wire repositories and services over a database
    pub fn new(security: &SecurityConfig, db: Arc<DatabaseManager>) -> Self {
        let user_repo = Arc::new(UserRepository::new(db.clone()));
        let sweet_repo = Arc::new(SweetRepository::new(db.clone()));

        let auth_service = Arc::new(AuthService::new(
            user_repo,
            security.jwt_secret.clone(),
            Duration::from_secs(security.token_ttl_hours * 3600),
            security.bcrypt_cost,
        ));

        Self {
            auth_service,
            sweet_service: Arc::new(SweetService::new(sweet_repo)),
            db,
            jwt_secret: Arc::new(security.jwt_secret.clone()),
        }
    }
}
