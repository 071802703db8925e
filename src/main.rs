//! Sweet Shop Backend
//!
//! HTTP service for browsing, buying and managing a sweet shop inventory.

use sweet_shop::{api, core, db};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting Sweet Shop Backend v{}", sweet_shop::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        path = ?config.database.path,
        pool_size = config.database.connection_pool_size,
        "Database configuration"
    );

    warn_on_insecure_settings(&config.security);

    info!("Initializing database...");
    let db = Arc::new(db::DatabaseManager::new(
        &config.database.path,
        config.database.connection_pool_size as u32,
        Duration::from_millis(config.database.busy_timeout),
    )?);
    info!("Database initialized successfully");

    let state = api::AppState::new(&config.security, db);

    ensure_admin_user(&state, &config.security).await?;

    let server_url = format!("http://{}:{}", config.server.host, config.server.port);
    let server = api::ApiServer::new(&config, state);

    info!(url = %server_url, "Server ready - starting to serve requests");

    server.serve().await?;

    Ok(())
}

fn warn_on_insecure_settings(security: &core::config::SecurityConfig) {
    if security.jwt_secret == core::config::DEFAULT_JWT_SECRET {
        warn!("Using the built-in JWT secret; set security.jwt_secret before exposing this server");
    }

    if security.allows_any_origin() && security.allow_credentials {
        warn!("CORS accepts every origin with credentials; restrict security.allowed_origins in production");
    }
}

/// Seed the configured admin account into an empty user table
async fn ensure_admin_user(state: &api::AppState, security: &core::config::SecurityConfig) -> Result<()> {
    let (Some(username), Some(password)) = (&security.admin_username, &security.admin_password) else {
        return Ok(());
    };

    match state.auth_service.ensure_admin(username, password).await? {
        Some(admin) => info!(username = %admin.username, "Bootstrap admin user created"),
        None => info!("Users already exist, skipping bootstrap admin"),
    }

    Ok(())
}
