use crate::api::extract::{Json, Path, Query};
use crate::api::models::{RestockQuery, SearchQuery, SweetRequest};
use crate::auth::middleware::AuthUser;
use crate::core::error::Result;
use crate::db::models::Sweet;
use axum::{extract::State, http::StatusCode};
use super::AppState;

/// Handler for GET /api/sweets - List all sweets
pub async fn list_sweets(State(state): State<AppState>) -> Result<Json<Vec<Sweet>>> {
    let sweets = state.sweet_service.list().await?;
    Ok(Json(sweets))
}

/// Handler for GET /api/sweets/search?q= - Search sweets by name or description
pub async fn search_sweets(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Sweet>>> {
    let sweets = state.sweet_service.search(query.q.as_deref()).await?;
    Ok(Json(sweets))
}

/// Handler for POST /api/sweets - Add a sweet (admin only)
pub async fn create_sweet(
    State(state): State<AppState>,
    admin: AuthUser,
    Json(req): Json<SweetRequest>,
) -> Result<Json<Sweet>> {
    let sweet = state.sweet_service.add(req).await?;

    tracing::info!(sweet_id = sweet.id, name = %sweet.name, admin = %admin.username, "Sweet created");

    Ok(Json(sweet))
}

/// Handler for PUT /api/sweets/:id - Replace a sweet (admin only)
pub async fn update_sweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    admin: AuthUser,
    Json(req): Json<SweetRequest>,
) -> Result<Json<Sweet>> {
    let sweet = state.sweet_service.update(id, req).await?;

    tracing::info!(sweet_id = id, admin = %admin.username, "Sweet updated");

    Ok(Json(sweet))
}

/// Handler for DELETE /api/sweets/:id - Delete a sweet (admin only)
pub async fn delete_sweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    admin: AuthUser,
) -> Result<StatusCode> {
    state.sweet_service.delete(id).await?;

    tracing::info!(sweet_id = id, admin = %admin.username, "Sweet deleted");

    Ok(StatusCode::OK)
}

/// Handler for POST /api/sweets/:id/purchase - Buy one unit
pub async fn purchase_sweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<Sweet>> {
    let sweet = state.sweet_service.purchase(id).await?;

    tracing::info!(
        sweet_id = id,
        purchaser = %user.username,
        remaining = sweet.quantity,
        "Sweet purchased"
    );

    Ok(Json(sweet))
}

/// Handler for POST /api/sweets/:id/restock?amount= - Add stock (admin only)
pub async fn restock_sweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RestockQuery>,
    admin: AuthUser,
) -> Result<Json<Sweet>> {
    let sweet = state.sweet_service.restock(id, query.amount).await?;

    tracing::info!(
        sweet_id = id,
        amount = query.amount,
        quantity = sweet.quantity,
        admin = %admin.username,
        "Sweet restocked"
    );

    Ok(Json(sweet))
}
