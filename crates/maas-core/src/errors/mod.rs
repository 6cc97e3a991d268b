// ABOUTME: Unified error type, error codes and HTTP rendering for the whole service
// ABOUTME: Maps authentication, validation, lifecycle, upstream and internal failures to status codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! # Unified Error Handling System
//!
//! Every fallible operation in the service returns [`AppResult`]. Handlers
//! return `Result<_, AppError>` directly: with the `http-response` feature
//! the error renders itself as
//! `{"error": {"code", "message", "retryable", "details"}}`.
//!
//! Internal failures (database, serialization, configuration) are logged in
//! full and rendered with a generic message so no internals leak to clients.

#[cfg(feature = "http-response")]
mod http_response;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the application
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// No session was presented
    AuthRequired,
    /// Session token or shared secret is wrong
    AuthInvalid,
    /// Webhook signature did not verify
    InvalidSignature,
    /// A required webhook/authentication header is absent
    MissingRequiredHeader,

    // Validation (3000-3999)
    /// The provided input is invalid
    InvalidInput,
    /// A required field is missing from the request
    MissingRequiredField,
    /// The user has no credits left
    InsufficientCredits,

    // Resources (4000-4999)
    /// The requested resource does not exist
    ResourceNotFound,
    /// The resource is in a state that forbids the operation
    StateConflict,

    // External services (5000-5999)
    /// An upstream service failed or returned an unusable response
    ExternalServiceError,
    /// An upstream service did not answer in time
    ExternalServiceTimeout,

    // Configuration (6000-6999)
    /// Required configuration is missing
    ConfigMissing,
    /// Configuration is present but invalid
    ConfigInvalid,

    // Internal (9000-9999)
    /// Unexpected internal failure
    InternalError,
    /// Database operation failed
    DatabaseError,
    /// Serialization or deserialization failed
    SerializationError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidSignature
            | Self::MissingRequiredHeader
            | Self::InvalidInput
            | Self::MissingRequiredField
            | Self::InsufficientCredits => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::ResourceNotFound => 404,
            Self::StateConflict => 409,
            Self::ExternalServiceError => 502,
            Self::ExternalServiceTimeout => 504,
            Self::ConfigMissing
            | Self::ConfigInvalid
            | Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError => 500,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::InvalidSignature => "The webhook signature could not be verified",
            Self::MissingRequiredHeader => "A required header is missing from the request",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::InsufficientCredits => "Not enough credits to start a generation",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::StateConflict => "The resource is in a state that does not allow this change",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceTimeout => "An external service did not respond in time",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal server error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether a client may reasonably retry the same request later
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::ExternalServiceError | Self::ExternalServiceTimeout
        )
    }

    /// Whether the message must be hidden from clients
    #[must_use]
    pub const fn is_internal(self) -> bool {
        matches!(
            self,
            Self::ConfigMissing
                | Self::ConfigInvalid
                | Self::InternalError
                | Self::DatabaseError
                | Self::SerializationError
        )
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
#[error("{}: {message}", code.description())]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional structured details rendered to the client
    pub details: Option<serde_json::Value>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Authentication required
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Webhook signature rejected
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSignature, message)
    }

    /// Required header missing
    pub fn missing_header(header: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredHeader,
            format!("Missing required header: {header}"),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing required field
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {field}"),
        )
    }

    /// No credits left
    #[must_use]
    pub fn insufficient_credits() -> Self {
        Self::new(
            ErrorCode::InsufficientCredits,
            "Credit balance is exhausted",
        )
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Lifecycle/state conflict
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External service timeout
    pub fn external_timeout(service: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceTimeout,
            format!("{} timed out", service.into()),
        )
    }

    /// Missing configuration
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("Missing configuration: {}", key.into()),
        )
    }

    /// Invalid configuration
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }
}

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Body of an [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Present and `true` for errors worth retrying
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    /// Structured details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        let message = if error.code.is_internal() {
            error.code.description().to_owned()
        } else {
            error.message.clone()
        };
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message,
                retryable: error.code.is_retryable(),
                details: if error.code.is_internal() {
                    None
                } else {
                    error.details.clone()
                },
            },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
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
        let service = error
            .url()
            .and_then(|u| u.host_str().map(ToOwned::to_owned))
            .unwrap_or_else(|| "upstream".to_owned());
        if error.is_timeout() {
            Self::external_timeout(service).with_source(error)
        } else {
            let message = error.status().map_or_else(
                || "request failed".to_owned(),
                |status| format!("responded with status {status}"),
            );
            Self::external_service(service, message).with_source(error)
        }
    }
}
