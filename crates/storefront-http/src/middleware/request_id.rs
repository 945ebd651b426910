//! Correlation IDs: every exchange is tagged with an `x-request-id` so a
//! client report can be matched to the server log lines it produced.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Tags the exchange with a correlation ID.
///
/// A non-empty `x-request-id` sent by the client is reused as is; a missing
/// or blank one is replaced by a fresh UUID v4. The ID is echoed on the
/// response whatever its status, including CORS rejections and 404s, and
/// the downstream pipeline runs inside a `request` span with the ID, method
/// and path attached.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let supplied = req
        .headers()
        .get(&X_REQUEST_ID)
        .filter(|v| !v.is_empty() && v.to_str().is_ok())
        .cloned();
    let id = match supplied {
        Some(value) => value,
        None => {
            let value = HeaderValue::try_from(Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unassigned"));
            req.headers_mut().insert(X_REQUEST_ID.clone(), value.clone());
            value
        }
    };

    let span = tracing::info_span!(
        "request",
        request_id = id.to_str().unwrap_or_default(),
        method = %req.method(),
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(X_REQUEST_ID.clone(), id);
    response
}
