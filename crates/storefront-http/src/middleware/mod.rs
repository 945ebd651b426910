//! HTTP middleware: CORS gate, body limit, request timeout, request ID tracking.

pub mod body_limit;
pub mod cors;
pub mod request_id;
pub mod timeout;
