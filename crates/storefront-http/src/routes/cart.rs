//! Cart endpoints, mounted at `/api/cart`.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};

use storefront_service::AppError;
use storefront_service::cart::CartService;
use storefront_service::types::{AddCartItem, Cart};

use crate::error::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_id}", get(get_cart).delete(clear_cart))
        .route("/{user_id}/items", post(add_item))
        .route("/{user_id}/items/{product_id}", delete(remove_item))
}

async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(CartService::get(state.store(), &user_id).await?))
}

/// Add a product, or raise its quantity when already in the cart.
async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    JsonBody(req): JsonBody<AddCartItem>,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(CartService::add_item(state.store(), &user_id, req).await?))
}

async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(String, String)>,
) -> Result<Json<Cart>, AppError> {
    Ok(Json(
        CartService::remove_item(state.store(), &user_id, &product_id).await?,
    ))
}

async fn clear_cart(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    CartService::clear(state.store(), &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
