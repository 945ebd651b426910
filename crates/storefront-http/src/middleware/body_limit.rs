//! Rejects oversized request bodies before any handler runs.
//!
//! Only a declared `Content-Length` can be checked up front. Streamed
//! bodies are capped by `DefaultBodyLimit` when a handler extracts them.

use axum::extract::{Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::middleware::Next;
use axum::response::Response;

use storefront_service::AppError;

use crate::state::AppState;

pub async fn body_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let limit = state.body_limit() as u64;
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if let Some(len) = declared
        && len > limit
    {
        tracing::warn!(len, limit, "request body too large");
        return Err(AppError::payload_too_large(format!(
            "request body of {len} bytes exceeds the {limit} byte limit"
        )));
    }

    Ok(next.run(req).await)
}
