//! Maps failures to the fixed sentences shown to site visitors.
//!
//! Raw statuses and CMS messages never reach a user directly. Everything
//! goes through [`user_message`] or one of the [`HandledError`]
//! constructors, which accept typed errors, arbitrary error values and
//! panic payloads alike.

use serde::Serialize;
use serde_json::{Value, json};
use std::any::Any;
use std::error::Error;

use crate::error::{ApiError, STATUS_NETWORK};

/// Fallback for unexpected error values
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Fallback for values that are not errors at all
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred. Please try again.";

/// User-facing sentence for a typed CMS error.
pub fn user_message(error: &ApiError) -> &'static str {
    message_for_status(error.status())
}

/// User-facing sentence for a bare status code.
pub fn message_for_status(status: u16) -> &'static str {
    match status {
        STATUS_NETWORK => "Network error. Please check your connection and try again.",
        400 => "Invalid request. Please check your input and try again.",
        401 => "Authentication failed. Please check your credentials.",
        403 => "Access denied. You do not have permission to perform this action.",
        404 => "The requested content was not found.",
        408 => "Request timeout. Please check your internet connection and try again.",
        429 => "Too many requests. Please wait a moment and try again.",
        502..=504 => "Service temporarily unavailable. Please try again later.",
        s if s >= 500 => "Server error. Please try again later.",
        _ => "An error occurred. Please try again.",
    }
}

/// A failure ready to be returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandledError {
    /// User-facing sentence
    pub message: String,
    /// Numeric status
    pub status: u16,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HandledError {
    /// Translate any error value.
    ///
    /// The source chain is searched for an [`ApiError`]; if none is found
    /// the error is reported as an unexpected server-class failure.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut current: Option<&(dyn Error + 'static)> = Some(error);
        while let Some(err) = current {
            if let Some(api) = err.downcast_ref::<ApiError>() {
                return Self::from(api);
            }
            current = err.source();
        }

        Self {
            message: UNEXPECTED_ERROR_MESSAGE.to_string(),
            status: 500,
            details: Some(json!({ "originalMessage": error.to_string() })),
        }
    }

    /// Translate a value that is not an error, such as a panic payload.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let text = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned());

        Self {
            message: UNKNOWN_ERROR_MESSAGE.to_string(),
            status: 500,
            details: Some(json!({ "error": text })),
        }
    }
}

impl From<&ApiError> for HandledError {
    fn from(error: &ApiError) -> Self {
        Self {
            message: user_message(error).to_string(),
            status: error.status(),
            details: error.details().cloned(),
        }
    }
}

impl From<ApiError> for HandledError {
    fn from(error: ApiError) -> Self {
        Self::from(&error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fmt;
    use std::time::Duration;

    #[derive(Debug)]
    struct Wrapper(ApiError);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "while loading page: {}", self.0)
        }
    }

    impl Error for Wrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_every_status_maps_to_a_sentence() {
        let statuses = [0, 400, 401, 403, 404, 408, 418, 429, 500, 501, 502, 503, 504, 599];
        for status in statuses {
            let message = message_for_status(status);
            assert!(!message.is_empty(), "status {status} has no message");
        }
    }

    #[test]
    fn test_fixed_sentences() {
        assert_eq!(
            message_for_status(404),
            "The requested content was not found."
        );
        assert_eq!(
            message_for_status(503),
            "Service temporarily unavailable. Please try again later."
        );
        assert_eq!(message_for_status(500), "Server error. Please try again later.");
        assert_eq!(message_for_status(507), "Server error. Please try again later.");
        assert_eq!(
            user_message(&ApiError::timeout(Duration::from_secs(10))),
            "Request timeout. Please check your internet connection and try again."
        );
    }

    #[test]
    fn test_typed_error_keeps_status() {
        let handled = HandledError::from(ApiError::from_response(401, "Unauthorized", None));

        assert_eq!(handled.status, 401);
        assert_eq!(
            handled.message,
            "Authentication failed. Please check your credentials."
        );
    }

    #[test]
    fn test_typed_error_found_in_source_chain() {
        let wrapped = Wrapper(ApiError::network("connection reset"));
        let handled = HandledError::from_error(&wrapped);

        assert_eq!(handled.status, 0);
        assert_eq!(
            handled.message,
            "Network error. Please check your connection and try again."
        );
    }

    #[test]
    fn test_generic_error() {
        let io = std::io::Error::other("disk full");
        let handled = HandledError::from_error(&io);

        assert_eq!(handled.status, 500);
        assert_eq!(handled.message, UNEXPECTED_ERROR_MESSAGE);
        assert_eq!(
            handled.details,
            Some(json!({ "originalMessage": "disk full" }))
        );
    }

    #[test]
    fn test_non_error_values() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let handled = HandledError::from_panic(payload.as_ref());
        assert_eq!(handled.status, 500);
        assert_eq!(handled.message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(handled.details, Some(json!({ "error": "boom" })));

        let number: Box<dyn Any + Send> = Box::new(42_u32);
        let handled = HandledError::from_panic(number.as_ref());
        assert_eq!(handled.message, UNKNOWN_ERROR_MESSAGE);
        assert_eq!(handled.details, Some(json!({ "error": null })));
    }
}
