//! Error types for CMS operations

use serde_json::{Value, json};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// Status used when the CMS could not be reached at all.
pub const STATUS_NETWORK: u16 = 0;

/// Status synthesized when an attempt exceeds the request timeout.
pub const STATUS_TIMEOUT: u16 = 408;

/// Where an [`ApiError`] was produced.
///
/// The status alone decides the error class. The origin only matters for
/// failures that carry a retryable-looking status but must not be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Rejected locally before any request was sent
    Validation,
    /// The CMS answered with a non-2xx status
    Response,
    /// Connection-level failure
    Network,
    /// The attempt exceeded the request timeout
    Timeout,
    /// Anything else, reported as a server-class failure
    Unknown,
}

/// Error returned by every CMS operation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    status: u16,
    message: String,
    details: Option<Value>,
    origin: ErrorOrigin,
}

impl ApiError {
    /// Error for a non-2xx CMS response.
    ///
    /// The message comes from `error.message` in the body when present,
    /// otherwise from the status line.
    pub fn from_response(status: u16, reason: &str, body: Option<Value>) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| b.pointer("/error/message"))
            .and_then(Value::as_str)
            .map_or_else(|| format!("HTTP {status}: {reason}"), str::to_string);

        let details = body.unwrap_or_else(|| json!({ "message": reason }));

        Self {
            status,
            message,
            details: Some(details),
            origin: ErrorOrigin::Response,
        }
    }

    /// Pre-flight validation failure. Never sent, never retried.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
            details: None,
            origin: ErrorOrigin::Validation,
        }
    }

    /// The CMS was unreachable.
    pub fn network(cause: impl Display) -> Self {
        Self {
            status: STATUS_NETWORK,
            message: "Network error - please check your connection".to_string(),
            details: Some(json!({ "originalError": cause.to_string() })),
            origin: ErrorOrigin::Network,
        }
    }

    /// The attempt was aborted after `timeout`.
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            status: STATUS_TIMEOUT,
            message: "Request timeout".to_string(),
            details: Some(json!({ "timeout": timeout.as_millis() as u64 })),
            origin: ErrorOrigin::Timeout,
        }
    }

    /// Wraps a failure that fits no other class.
    pub fn unknown(cause: impl Display) -> Self {
        Self {
            status: 500,
            message: "Unknown error occurred".to_string(),
            details: Some(json!({ "originalError": cause.to_string() })),
            origin: ErrorOrigin::Unknown,
        }
    }

    /// Numeric status (HTTP code, 0 for network, 408 for timeout)
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional structured details
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Where the error was produced
    pub fn origin(&self) -> ErrorOrigin {
        self.origin
    }

    /// Status in `[400, 500)`
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Status at or above 500
    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self.origin {
            ErrorOrigin::Validation | ErrorOrigin::Unknown => false,
            ErrorOrigin::Network | ErrorOrigin::Timeout => true,
            // Any 4xx the CMS answers with, 408 included, is final
            ErrorOrigin::Response => self.is_server_error(),
        }
    }
}

/// Result type for CMS operations
pub type Result<T> = std::result::Result<T, ApiError>;
