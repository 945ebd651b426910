//! Error types for every request path.
//!
//! `AppError` is transport-agnostic. The `IntoResponse` impl (the terminal
//! JSON error handler) is gated behind the `http` feature.

use std::fmt;

/// Message sent to clients in place of internal failure details.
pub const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Message for a write rejected by a unique index. Services usually swap it
/// for a resource-specific one with [`AppError::on_conflict`].
pub const DUPLICATE_MESSAGE: &str = "duplicate value for a unique field";

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Error shared by the service layer and the HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Expected failure raised on purpose (not found, validation, conflict).
    /// The message is safe to show to the caller.
    #[error("{message}")]
    Operational { message: String, status: u16 },

    /// Anything else: driver faults, serialization failures, panics.
    #[error("internal error: {cause}")]
    Internal { cause: String },
}

impl AppError {
    /// Creates an operational error with an explicit HTTP status code.
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self::Operational {
            message: message.into(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, 400)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, 403)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, 404)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message, 409)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(message, 413)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(message, 503)
    }

    /// Wraps an unexpected failure. The cause is logged, never sent.
    pub fn internal(cause: impl fmt::Display) -> Self {
        Self::Internal {
            cause: cause.to_string(),
        }
    }

    /// Caller-facing message.
    pub fn message(&self) -> &str {
        match self {
            Self::Operational { message, .. } => message,
            Self::Internal { .. } => INTERNAL_MESSAGE,
        }
    }

    /// Status code the error was raised with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Operational { status, .. } => *status,
            Self::Internal { .. } => 500,
        }
    }

    /// Status written on the wire: client and server error classes pass
    /// through, anything else collapses to 500.
    pub fn response_status(&self) -> u16 {
        let status = self.status_code();
        if (400..=599).contains(&status) {
            status
        } else {
            500
        }
    }

    /// `true` for errors raised on purpose, `false` for unexpected failures.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Operational { .. })
    }

    /// Replaces the message of a 409, leaving every other error untouched.
    #[must_use]
    pub fn on_conflict(self, message: impl FnOnce() -> String) -> Self {
        if self.status_code() == 409 {
            Self::conflict(message())
        } else {
            self
        }
    }

    /// Internal cause, if this is an unexpected failure.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Operational { .. } => None,
            Self::Internal { cause } => Some(cause),
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            tracing::debug!(error = %err, "unique index violation");
            return Self::conflict(DUPLICATE_MESSAGE);
        }
        Self::internal(format!("database: {err}"))
    }
}

/// Plain writes report the violation as a write error, `findAndModify`
/// upserts as a command error.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::internal(format!("bson encode: {err}"))
    }
}

impl From<mongodb::bson::de::Error> for AppError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        Self::internal(format!("bson decode: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("json: {err}"))
    }
}

// ---------------------------------------------------------------------------
// HTTP response conversion (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "http")]
mod http_impl {
    use super::AppError;
    use axum::extract::rejection::JsonRejection;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use serde::{Deserialize, Serialize};

    /// JSON body of every error response.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ErrorBody {
        /// `"fail"` for client errors, `"error"` for server errors.
        pub status: String,
        pub status_code: u16,
        pub message: String,
    }

    impl From<&AppError> for ErrorBody {
        fn from(err: &AppError) -> Self {
            let status_code = err.response_status();
            let status = if status_code < 500 { "fail" } else { "error" };
            Self {
                status: status.to_string(),
                status_code,
                message: err.message().to_string(),
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let body = ErrorBody::from(&self);

            match &self {
                AppError::Operational { message, .. } => {
                    tracing::debug!(status = body.status_code, %message, "request failed");
                }
                AppError::Internal { cause } => {
                    tracing::error!(%cause, "internal server error");
                }
            }

            let status = StatusCode::from_u16(body.status_code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, axum::Json(body)).into_response()
        }
    }

    impl From<JsonRejection> for AppError {
        fn from(rejection: JsonRejection) -> Self {
            AppError::new(rejection.body_text(), rejection.status().as_u16())
        }
    }
}

#[cfg(feature = "http")]
pub use http_impl::ErrorBody;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operational_error_exposes_fields() {
        let err = AppError::new("Cannot find /nope", 404);
        assert_eq!(err.message(), "Cannot find /nope");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.response_status(), 404);
        assert!(err.is_operational());
        assert!(err.cause().is_none());
        assert_eq!(err.to_string(), "Cannot find /nope");
    }

    #[test]
    fn internal_error_hides_cause() {
        let err = AppError::internal("connection reset by peer");
        assert_eq!(err.message(), INTERNAL_MESSAGE);
        assert_eq!(err.status_code(), 500);
        assert!(!err.is_operational());
        assert_eq!(err.cause(), Some("connection reset by peer"));
    }

    #[test]
    fn out_of_range_status_falls_back_to_500() {
        assert_eq!(AppError::new("ok?", 200).response_status(), 500);
        assert_eq!(AppError::new("redirect?", 302).response_status(), 500);
        assert_eq!(AppError::new("nonsense", 999).response_status(), 500);
        assert_eq!(AppError::new("teapot", 418).response_status(), 418);
        assert_eq!(AppError::new("bad gateway", 502).response_status(), 502);
    }

    #[test]
    fn on_conflict_rewrites_only_conflicts() {
        let err = AppError::conflict(DUPLICATE_MESSAGE).on_conflict(|| "email taken".into());
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), "email taken");

        let err = AppError::internal("socket closed").on_conflict(|| "email taken".into());
        assert!(!err.is_operational());
        assert_eq!(err.cause(), Some("socket closed"));

        let err = AppError::not_found("gone").on_conflict(|| "email taken".into());
        assert_eq!(err.message(), "gone");
    }

    #[test]
    fn json_errors_are_internal() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!err.is_operational());
        assert!(err.cause().unwrap().starts_with("json:"));
    }
}
