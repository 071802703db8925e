//! API routes

use crate::api::handlers::{
    create_sweet, delete_sweet, list_sweets, purchase_sweet, restock_sweet, search_sweets,
    update_sweet, AppState,
};
use crate::auth::handlers::{login, register};
use axum::{
    routing::{get, post, put},
    Router,
};

/// Build the routes mounted under `/api`
///
/// Access rules live in [`crate::auth::policy`]; nothing here is gated.
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/sweets", get(list_sweets).post(create_sweet))
        .route("/sweets/search", get(search_sweets))
        .route("/sweets/:id", put(update_sweet).delete(delete_sweet))
        .route("/sweets/:id/purchase", post(purchase_sweet))
        .route("/sweets/:id/restock", post(restock_sweet))
        .with_state(state)
}
