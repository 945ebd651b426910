//! Origin allow-list: the gate that rejects foreign origins and the
//! `tower-http` layer that answers admitted ones with CORS headers.

use axum::extract::{Request, State};
use axum::http::header::{self, HeaderName, InvalidHeaderValue};
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::CorsLayer;

use storefront_service::AppError;

use crate::state::AppState;

/// Origins admitted when none are configured explicitly.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:4000",
    "http://localhost:3000",
    "http://localhost:4002",
];

/// Message of the error raised for rejected origins.
pub const CORS_REJECTION: &str = "Not allowed by CORS";

#[derive(Debug, Clone, PartialEq, Eq)]
enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

/// Fixed set of origins permitted to make cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    allowed: AllowedOrigins,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed: AllowedOrigins::List(
                DEFAULT_ALLOWED_ORIGINS
                    .into_iter()
                    .map(HeaderValue::from_static)
                    .collect(),
            ),
        }
    }
}

impl CorsPolicy {
    /// Builds a policy from exact origin strings. A lone `"*"` admits every
    /// origin. Blank entries are ignored.
    pub fn new<I, S>(origins: I) -> Result<Self, InvalidHeaderValue>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| o.as_ref().trim().to_owned())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.len() == 1 && origins[0] == "*" {
            return Ok(Self {
                allowed: AllowedOrigins::Any,
            });
        }

        let list = origins
            .iter()
            .map(|o| HeaderValue::from_str(o))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            allowed: AllowedOrigins::List(list),
        })
    }

    /// Requests without an `Origin` always pass; otherwise the origin must
    /// match an allow-list entry byte for byte.
    pub fn allows(&self, origin: Option<&HeaderValue>) -> bool {
        match (origin, &self.allowed) {
            (None, _) | (Some(_), AllowedOrigins::Any) => true,
            (Some(origin), AllowedOrigins::List(list)) => list.contains(origin),
        }
    }

    /// Response-header layer for admitted cross-origin requests.
    pub fn layer(&self) -> CorsLayer {
        let x_request_id = HeaderName::from_static("x-request-id");
        let base = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                x_request_id.clone(),
            ])
            .expose_headers([x_request_id]);

        match &self.allowed {
            AllowedOrigins::Any => {
                tracing::warn!(
                    "CORS configured with wildcard origin, all cross-origin requests allowed"
                );
                base.allow_origin(tower_http::cors::Any)
            }
            // Nothing configured: no CORS headers, only same-origin callers.
            AllowedOrigins::List(list) if list.is_empty() => CorsLayer::new(),
            AllowedOrigins::List(list) => base.allow_origin(list.clone()),
        }
    }
}

/// Rejects requests whose `Origin` is not allow-listed before any router
/// runs. Preflight requests go through the same check.
pub async fn cors_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = req.headers().get(header::ORIGIN);
    if !state.cors_policy().allows(origin) {
        tracing::warn!(?origin, path = %req.uri().path(), "cross-origin request rejected");
        return Err(AppError::forbidden(CORS_REJECTION));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(s: &'static str) -> HeaderValue {
        HeaderValue::from_static(s)
    }

    #[test]
    fn default_policy_admits_localhost_origins() {
        let policy = CorsPolicy::default();
        assert!(policy.allows(Some(&origin("http://localhost:3000"))));
        assert!(policy.allows(Some(&origin("http://localhost:4000"))));
        assert!(policy.allows(Some(&origin("http://localhost:4002"))));
    }

    #[test]
    fn missing_origin_always_passes() {
        assert!(CorsPolicy::default().allows(None));
        assert!(CorsPolicy::new(Vec::<String>::new()).unwrap().allows(None));
    }

    #[test]
    fn unlisted_origins_are_rejected() {
        let policy = CorsPolicy::default();
        assert!(!policy.allows(Some(&origin("http://evil.example"))));
        // Exact match only: scheme, port and trailing slash all matter.
        assert!(!policy.allows(Some(&origin("https://localhost:3000"))));
        assert!(!policy.allows(Some(&origin("http://localhost:3001"))));
        assert!(!policy.allows(Some(&origin("http://localhost:3000/"))));
        assert!(!policy.allows(Some(&origin("null"))));
    }

    #[test]
    fn configured_list_replaces_defaults() {
        let policy = CorsPolicy::new(["https://shop.example", " ", "https://admin.example "])
            .unwrap();
        assert!(policy.allows(Some(&origin("https://shop.example"))));
        assert!(policy.allows(Some(&origin("https://admin.example"))));
        assert!(!policy.allows(Some(&origin("http://localhost:3000"))));
    }

    #[test]
    fn empty_list_rejects_every_cross_origin_request() {
        let policy = CorsPolicy::new(Vec::<String>::new()).unwrap();
        assert!(!policy.allows(Some(&origin("http://localhost:3000"))));
    }

    #[test]
    fn wildcard_admits_everything() {
        let policy = CorsPolicy::new(["*"]).unwrap();
        assert!(policy.allows(Some(&origin("http://evil.example"))));
    }

    #[test]
    fn invalid_origin_is_a_config_error() {
        assert!(CorsPolicy::new(["http://bad\norigin"]).is_err());
    }
}
