//! Storefront Server - e-commerce backend bootstrap.
//!
//! Wires configuration, the document database and the HTTP transport:
//! - `storefront-service` - error type, document store, resource services
//! - `storefront-http`    - routers, middleware, terminal error handler

pub mod config;

pub use storefront_http::{App, AppState, HttpConfig, app, router, serve};
pub use storefront_service::{AppError, ServiceState};
