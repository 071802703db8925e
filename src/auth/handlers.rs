//! Authentication API handlers

use crate::api::extract::Json;
use crate::api::handlers::AppState;
use crate::auth::models::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest};
use crate::core::error::Result;
use axum::extract::State;

/// Handler for POST /api/auth/register - User registration
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>> {
    tracing::info!(username = %req.username, "User registration attempt");

    let user = state
        .auth_service
        .register(&req.username, &req.password, req.role.as_deref())
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, role = %user.role, "User registered successfully");

    Ok(Json(MessageResponse::new("User registered successfully")))
}

/// Handler for POST /api/auth/login - User login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    tracing::info!(username = %req.username, "Login attempt");

    let response = state.auth_service.authenticate(&req.username, &req.password).await?;

    tracing::info!(user_id = response.user.id, username = %response.user.username, "Login successful");

    Ok(Json(response))
}
