// ABOUTME: Unified error type, error codes and HTTP error payloads for FounderHub
// ABOUTME: Maps every failure in the system onto a stable code and HTTP status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Errors
//!
//! Every fallible operation in the backend returns [`AppResult`]. An [`AppError`]
//! carries a stable [`ErrorCode`] which determines the HTTP status and the
//! machine-readable `code` field of the JSON error payload:
//!
//! ```json
//! { "error": { "code": "QUOTA_EXCEEDED", "message": "...", "details": { ... } } }
//! ```
//!
//! Conversions from `sqlx::Error` and `reqwest::Error` are feature gated so
//! that consumers only pull in the dependencies they need.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Stable, machine-readable failure codes
///
/// Serialized in `SCREAMING_SNAKE_CASE`; the numeric value groups codes by area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// No credentials were supplied
    AuthRequired = 1000,
    /// Credentials were supplied but are not valid
    AuthInvalid = 1001,
    /// Credentials have expired
    AuthExpired = 1002,

    // Usage limits (2000-2999)
    /// Tenant has consumed its monthly token allowance
    QuotaExceeded = 2001,

    // Validation (3000-3999)
    /// Request input failed validation
    InvalidInput = 3000,
    /// A required field is missing
    MissingRequiredField = 3001,

    // Resources (4000-4999)
    /// Requested resource does not exist or is not visible to the caller
    ResourceNotFound = 4000,

    // External services (5000-5999)
    /// An external collaborator (assistant backend, webhook target) failed
    ExternalServiceError = 5000,
    /// Every configured inference backend failed for one generation
    GenerationFailed = 5004,

    // Configuration (6000-6999)
    /// Configuration is missing or invalid
    ConfigError = 6000,

    // Internal (9000-9999)
    /// Unexpected internal failure
    InternalError = 9000,
    /// Storage layer failure
    DatabaseError = 9001,
    /// Serialization or deserialization failed
    SerializationError = 9003,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => 400,
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired => 401,
            Self::ResourceNotFound => 404,
            Self::QuotaExceeded => 429,
            Self::ExternalServiceError | Self::GenerationFailed => 502,
            Self::ConfigError
            | Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError => 500,
        }
    }

    /// User-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::AuthExpired => "The authentication token has expired",
            Self::QuotaExceeded => "Monthly token quota exceeded for your current plan",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::GenerationFailed => "AI generation failed on every configured backend",
            Self::ConfigError => "Configuration error encountered",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Error returned by every FounderHub operation
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Detail for the caller, without the code description
    pub message: String,
    /// Structured details rendered into the response payload
    pub details: Value,
    /// Request ID for tracing, when known
    pub request_id: Option<String>,
    /// Underlying cause, kept for logs
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Error with no details attached
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Value::Null,
            request_id: None,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Attach a request ID
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Record the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// No bearer token on the request
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Missing bearer token")
    }

    /// Token failed verification
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Token is past its `exp`
    #[must_use]
    pub fn auth_expired() -> Self {
        Self::new(ErrorCode::AuthExpired, "Bearer token has expired")
    }

    /// Monthly quota exhausted
    #[must_use]
    pub fn quota_exceeded(used: u64, cap: u64, requested: u64) -> Self {
        Self::new(
            ErrorCode::QuotaExceeded,
            format!("Monthly token quota of {cap} exceeded"),
        )
        .with_details(serde_json::json!({
            "tokens_used": used,
            "token_cap": cap,
            "tokens_requested": requested,
        }))
    }

    /// Missing, or owned by another tenant
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        Self::new(ErrorCode::ResourceNotFound, format!("{resource} not found"))
    }

    /// Request content that parsed but cannot be accepted
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Blank or absent request field
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Field '{field}' is required"),
        )
    }

    /// Unexpected server-side failure
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Storage query or connection failure
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Bad or missing setting at startup
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// JSON encoding or decoding of stored data failed
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// A collaborator failed; the message is prefixed with its name
    #[must_use]
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        let (service, message) = (service.into(), message.into());
        Self::new(ErrorCode::ExternalServiceError, format!("{service}: {message}"))
    }

    /// All inference backends failed for a single generation
    #[must_use]
    pub fn generation_failed(attempts: &[(String, String)]) -> Self {
        let details: Vec<Value> = attempts
            .iter()
            .map(|(backend, error)| serde_json::json!({ "backend": backend, "error": error }))
            .collect();
        Self::new(
            ErrorCode::GenerationFailed,
            format!("Generation failed after {} backend attempt(s)", attempts.len()),
        )
        .with_details(Value::Array(details))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code.description())?;
        write!(f, ": {}", self.message)
    }
}

/// Shorthand used across the workspace
pub type AppResult<T> = Result<T, AppError>;

/// JSON body of every non-2xx response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Stable error code
    pub code: ErrorCode,
    pub message: String,
    /// Request ID when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Structured details
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl From<AppError> for ErrorResponse {
    fn from(AppError { code, message, details, request_id, .. }: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code,
                message,
                request_id,
                details,
            },
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = ?self.code, error = %self.message, "Request failed");
        } else {
            tracing::debug!(code = ?self.code, error = %self.message, "Request rejected");
        }
        (status, axum::Json(ErrorResponse::from(self))).into_response()
    }
}

#[cfg(feature = "http-response")]
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        let reason = rejection.body_text();
        Self::invalid_input(format!("Malformed request body: {reason}"))
            .with_details(serde_json::json!({ "reason": reason }))
            .with_source(rejection)
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => Self::not_found("Record"),
            other => Self::database(other.to_string()).with_source(other),
        }
    }
}

#[cfg(feature = "provider-errors")]
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            format!("request timed out: {error}")
        } else if error.is_connect() {
            format!("connection failed: {error}")
        } else {
            error.to_string()
        };
        Self::external_service("http", message).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::AuthExpired.http_status(), 401);
        assert_eq!(ErrorCode::QuotaExceeded.http_status(), 429);
        assert_eq!(ErrorCode::ResourceNotFound.http_status(), 404);
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::GenerationFailed.http_status(), 502);
        assert_eq!(ErrorCode::ExternalServiceError.http_status(), 502);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_quota_error_details() {
        let error = AppError::quota_exceeded(950, 1000, 800);
        assert_eq!(error.code, ErrorCode::QuotaExceeded);
        assert_eq!(error.details["token_cap"], 1000);
        assert_eq!(error.details["tokens_used"], 950);
    }

    #[test]
    fn test_payload_omits_null_details() {
        let payload = ErrorResponse::from(AppError::not_found("Idea").with_request_id("req-123"));
        let json = serde_json::to_value(&payload).unwrap_or_default();

        assert_eq!(json["error"]["code"], "RESOURCE_NOT_FOUND");
        assert_eq!(json["error"]["message"], "Idea not found");
        assert_eq!(json["error"]["request_id"], "req-123");
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_generation_failed_lists_attempts() {
        let error = AppError::generation_failed(&[
            ("gpu".to_owned(), "timeout".to_owned()),
            ("openai".to_owned(), "500".to_owned()),
        ]);
        assert_eq!(error.code, ErrorCode::GenerationFailed);
        assert_eq!(error.details.as_array().map(Vec::len), Some(2));
    }
}
