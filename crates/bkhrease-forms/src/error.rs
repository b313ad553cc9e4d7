//! Error types for the forms service.

use bkhrease_cms::ApiError;
use thiserror::Error;

/// Rejections of a submitted form. Each maps to a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required fields absent or blank
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Please provide a valid email address.")]
    InvalidEmail,

    #[error("Message must be at least {min} characters long.")]
    MessageTooShort {
        /// Minimum accepted length in characters
        min: usize,
    },
}

/// The request body could not be read as a form at all.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Request body must be a JSON object")]
    NotAnObject,
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Forwarding is enabled but the CMS settings are unusable
    #[error("CMS forwarding is misconfigured: {}", .0.join("; "))]
    Cms(Vec<String>),
}

/// Server runtime errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind HTTP server
    #[error("Failed to bind HTTP server to {addr}: {source}")]
    HttpBindFailed {
        /// Address that failed to bind
        addr: std::net::SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CMS client could not be created
    #[error("CMS client error: {0}")]
    Cms(#[from] ApiError),

    /// Server shutdown error
    #[error("Server shutdown error: {0}")]
    Shutdown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::MissingFields(vec!["subject".to_string(), "serviceType".to_string()]);
        assert_eq!(err.to_string(), "Missing required fields: subject, serviceType");

        assert_eq!(
            ValidationError::MessageTooShort { min: 10 }.to_string(),
            "Message must be at least 10 characters long."
        );
    }

    #[test]
    fn test_server_error_conversion() {
        let config_err = ConfigError::Cms(vec!["STRAPI_API_TOKEN is not configured".to_string()]);
        let server_err: ServerError = config_err.into();
        assert!(server_err.to_string().contains("STRAPI_API_TOKEN"));
    }
}
