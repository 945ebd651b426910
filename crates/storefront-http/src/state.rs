//! HTTP application state: wraps `ServiceState` with HTTP-specific fields.
//!
//! `AppState` provides transparent access to all `ServiceState` methods
//! via `Deref`, and adds transport-specific config like the CORS policy,
//! body limit and request timeout.

use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use storefront_service::ServiceState;

use crate::middleware::cors::CorsPolicy;

/// Default request body limit: 100 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 100 * 1024 * 1024;

/// Default request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings, fixed at process start.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub cors: CorsPolicy,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
    /// `Duration::ZERO` disables the timeout.
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors: CorsPolicy::default(),
            body_limit: DEFAULT_BODY_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Shared HTTP application state, cloneable across handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInner>,
}

struct AppInner {
    service: ServiceState,
    http: HttpConfig,
}

impl Deref for AppState {
    type Target = ServiceState;

    fn deref(&self) -> &ServiceState {
        &self.inner.service
    }
}

impl AppState {
    pub fn new(service: ServiceState, http: HttpConfig) -> Self {
        Self {
            inner: Arc::new(AppInner { service, http }),
        }
    }

    /// Creates an in-memory application state with default HTTP settings
    /// (for tests and ephemeral use).
    pub fn new_in_memory() -> Self {
        Self::new_in_memory_with(HttpConfig::default())
    }

    /// Creates an in-memory application state with custom HTTP settings.
    pub fn new_in_memory_with(http: HttpConfig) -> Self {
        Self::new(ServiceState::new_in_memory(), http)
    }

    pub fn cors_policy(&self) -> &CorsPolicy {
        &self.inner.http.cors
    }

    pub fn body_limit(&self) -> usize {
        self.inner.http.body_limit
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.http.request_timeout
    }

    /// Returns a reference to the underlying service state.
    pub fn service(&self) -> &ServiceState {
        &self.inner.service
    }
}
