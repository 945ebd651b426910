//! Product endpoints, mounted at `/api/product`.

use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;

use storefront_service::AppError;
use storefront_service::catalog::CatalogService;
use storefront_service::types::{NewProduct, Product, ProductFilter};

use crate::error::JsonBody;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", get(get_product).delete(delete_product))
}

/// List products, optionally only those in `?category=<id>`.
async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(
        CatalogService::list_products(state.store(), &filter).await?,
    ))
}

async fn create_product(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = CatalogService::create_product(state.store(), req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(CatalogService::get_product(state.store(), &id).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    CatalogService::delete_product(state.store(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
