//! Category endpoints, mounted at `/api/category`.

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::get;

use storefront_service::AppError;
use storefront_service::catalog::CatalogService;
use storefront_service::types::{Category, NewCategory};

use crate::error::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", get(get_category).delete(delete_category))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(CatalogService::list_categories(state.store()).await?))
}

async fn create_category(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NewCategory>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CatalogService::create_category(state.store(), req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(CatalogService::get_category(state.store(), &id).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    CatalogService::delete_category(state.store(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
