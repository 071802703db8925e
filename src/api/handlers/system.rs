use crate::api::models::{DatabaseHealth, HealthResponse, HealthStatus};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use super::AppState;

/// Health check endpoint
///
/// Responds 503 when the database cannot answer a trivial query.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = check_database_health(&state).await;
    let status = database.status;

    let code = match status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (code, Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().timestamp(),
        database,
    }))
}

async fn check_database_health(state: &AppState) -> DatabaseHealth {
    let probe = state.db.execute(|conn| {
        Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?)
    }).await;

    let (status, message) = match probe {
        Ok(_) => (HealthStatus::Ok, None),
        Err(e) => {
            tracing::error!(error = %e, "Database health probe failed");
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    };

    DatabaseHealth {
        status,
        message,
        pool_size: state.db.pool_size(),
        idle_connections: state.db.idle_connections(),
    }
}
