//! Storefront HTTP - REST transport adapter for the Storefront server.
//!
//! Mounts the resource routers and wraps them in the request pipeline:
//! - CORS gate and CORS response headers
//! - body limit, gzip compression, request timeout, panic capture
//! - request-ID tracking and request tracing
//! - trailing-slash normalization ahead of routing
//! - a catch-all 404 and the terminal JSON error handler

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, OriginalUri, Request};
use axum::{Router, ServiceExt};
use tower::util::MapRequest;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

pub use state::{AppState, HttpConfig};

/// Builds the HTTP API router.
///
/// Requests flow through the layers outermost first: request ID, CORS gate,
/// CORS headers, body limit, tracing, compression, timeout, panic capture,
/// then the first router whose prefix matches. Unmatched requests hit the
/// not-found fallback. Every error becomes a response in exactly one place,
/// `AppError`'s `IntoResponse` impl.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth/admin", routes::admin::router())
        .nest("/api/auth", routes::user::router())
        .nest("/api/category", routes::category::router())
        .nest("/api/product", routes::product::router())
        .nest("/api/cart", routes::cart::router())
        .fallback(routes::fallback::not_found)
        .method_not_allowed_fallback(routes::fallback::not_found)
        .layer(DefaultBodyLimit::max(state.body_limit()))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::timeout::timeout_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::body_limit::body_limit_middleware,
        ))
        .layer(state.cors_policy().layer())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::cors::cors_gate,
        ))
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .with_state(state)
}

/// The servable application: [`router`] behind trailing-slash trimming.
pub type App = MapRequest<NormalizePath<Router>, fn(Request) -> Request>;

/// Wraps [`router`] so `/api/category/` routes like `/api/category`.
///
/// Trimming has to happen before route matching, so it sits outside the
/// router. The URL as received is recorded first; axum keeps an existing
/// `OriginalUri`, so the not-found message still shows the trailing slash.
pub fn app(state: AppState) -> App {
    MapRequest::new(
        NormalizePath::trim_trailing_slash(router(state)),
        record_original_uri as fn(Request) -> Request,
    )
}

fn record_original_uri(mut req: Request) -> Request {
    let uri = req.uri().clone();
    req.extensions_mut().insert(OriginalUri(uri));
    req
}

/// Serve the application on the given listener with graceful shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: App,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) {
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<std::net::SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .expect("server error");
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, Bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt as _;

    use super::*;
    use crate::error::ErrorBody;

    async fn call(uri: &str) -> (StatusCode, Bytes) {
        let resp = app(AppState::new_in_memory())
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    #[tokio::test]
    async fn trailing_slash_reaches_mounted_root_routes() {
        for uri in ["/api/category/", "/api/product/", "/api/category//"] {
            let (status, body) = call(uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(&body[..], b"[]", "{uri}");
        }
    }

    #[tokio::test]
    async fn not_found_keeps_the_url_as_received() {
        let (status, body) = call("/nowhere/?page=2").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.message, "Cannot find /nowhere/?page=2");
    }
}
