//! User endpoints, mounted at `/api/auth`.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};

use storefront_service::AppError;
use storefront_service::account::AccountService;
use storefront_service::types::{NewUser, User};

use crate::error::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/users/{id}", get(get_user))
}

/// Register a user.
async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AccountService::register(state.store(), req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(AccountService::get(state.store(), &id).await?))
}
