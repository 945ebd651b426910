//! Request timeout: answers slow requests through the terminal error handler.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use storefront_service::AppError;

use crate::state::AppState;

/// Message of the error raised when a request runs out of time.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Fails the request with 503 once the configured timeout elapses.
/// A zero timeout disables the check.
pub async fn timeout_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let timeout = state.request_timeout();
    if timeout.is_zero() {
        return Ok(next.run(req).await);
    }

    match tokio::time::timeout(timeout, next.run(req)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            tracing::warn!("request timed out after {timeout:?}");
            Err(AppError::service_unavailable(TIMEOUT_MESSAGE))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;
    use crate::state::HttpConfig;

    fn app(timeout: Duration) -> Router {
        let state = AppState::new_in_memory_with(HttpConfig {
            request_timeout: timeout,
            ..HttpConfig::default()
        });
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    "done"
                }),
            )
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                timeout_middleware,
            ))
            .with_state(state)
    }

    async fn get_slow(app: Router) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn slow_request_times_out_with_503() {
        let (status, body) = get_slow(app(Duration::from_millis(20))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["statusCode"], 503);
        assert_eq!(body["message"], TIMEOUT_MESSAGE);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn zero_timeout_disables_the_check() {
        let (status, _) = get_slow(app(Duration::ZERO)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
