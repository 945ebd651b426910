//! Admin endpoints, mounted at `/api/auth/admin`.

use axum::Router;
use axum::extract::{Json, State};
use axum::routing::get;

use storefront_service::AppError;
use storefront_service::admin::AdminService;
use storefront_service::types::{StoreStats, User};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/stats", get(stats))
}

/// List every registered user.
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(AdminService::list_users(state.service()).await?))
}

/// Document counts per collection and process uptime.
async fn stats(State(state): State<AppState>) -> Result<Json<StoreStats>, AppError> {
    Ok(Json(AdminService::stats(state.service()).await?))
}
