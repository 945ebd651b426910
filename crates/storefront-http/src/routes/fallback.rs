//! Catch-all for requests no mounted router handles.

use axum::extract::OriginalUri;

use storefront_service::AppError;

/// Raises `Cannot find <url>` for the URL exactly as received, query
/// string included.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str());
    AppError::not_found(format!("Cannot find {target}"))
}
