//! Terminal error handling for the HTTP transport.
//!
//! Every failure leaves the router as an [`AppError`] and is rendered by its
//! `IntoResponse` impl. This module covers the failures that do not start
//! out as an `AppError`: malformed request bodies and handler panics.

use std::any::Any;

use axum::extract::FromRequest;
use axum::response::{IntoResponse, Response};

pub use storefront_service::AppError;
pub use storefront_service::error::ErrorBody;

/// JSON body extractor whose rejections go through the terminal handler
/// instead of axum's plain-text responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Converts a caught handler panic into a 500. The payload is logged, never
/// sent to the client.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("handler panicked: {detail}")).into_response()
}
