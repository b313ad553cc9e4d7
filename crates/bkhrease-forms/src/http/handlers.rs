//! HTTP request handlers for the form endpoints.

use crate::error::ValidationError;
use crate::server::AppState;
use crate::validation;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bkhrease_cms::{HealthState, HealthStatus};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub const CONTACT_SUCCESS_MESSAGE: &str = "Thank you for your message! We have received your inquiry and will get back to you within 24 hours.";
pub const CONTACT_FAILURE_MESSAGE: &str =
    "Something went wrong processing your request. Please try again later.";
pub const NEWSLETTER_SUCCESS_MESSAGE: &str =
    "Thank you for subscribing! Please check your email to confirm your subscription.";
pub const NEWSLETTER_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Body of an accepted submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub message: String,
    pub success: bool,
}

/// Handle POST /api/contact.
pub async fn handle_contact(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Accepted>, AppError> {
    let data = validation::parse_body(&body).map_err(|e| {
        tracing::error!("Contact form submission error: {e}");
        AppError::Internal(CONTACT_FAILURE_MESSAGE)
    })?;
    let form = validation::validate_contact(&data)?;

    tracing::info!(
        name = %form.name,
        email = %form.email,
        phone = form.phone.as_deref().unwrap_or("Not provided"),
        subject = form.subject.as_deref().unwrap_or_default(),
        service_type = form.service_type.as_deref().unwrap_or_default(),
        "Contact form submission"
    );

    if let Some(cms) = state.cms() {
        cms.submit_contact_form(&form).await.map_err(|e| {
            tracing::error!(status = e.status(), "Contact form forwarding failed: {e}");
            AppError::Internal(CONTACT_FAILURE_MESSAGE)
        })?;
    }

    Ok(Json(Accepted {
        message: CONTACT_SUCCESS_MESSAGE.to_string(),
        success: true,
    }))
}

/// Handle POST /api/newsletter.
///
/// A repeated subscription is reported with `success: false` and status 200.
pub async fn handle_newsletter(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Accepted>, AppError> {
    let data = validation::parse_body(&body).map_err(|e| {
        tracing::error!("Newsletter subscription error: {e}");
        AppError::Internal(NEWSLETTER_FAILURE_MESSAGE)
    })?;
    let signup = validation::validate_newsletter(&data)?;

    tracing::info!(
        email = %signup.email,
        source = %signup.source,
        list = ?signup.list,
        "Newsletter subscription"
    );

    if let Some(cms) = state.cms() {
        let outcome = cms
            .subscribe_to_newsletter(&signup.email, signup.list)
            .await
            .map_err(|e| {
                tracing::error!(status = e.status(), "Newsletter forwarding failed: {e}");
                AppError::Internal(NEWSLETTER_FAILURE_MESSAGE)
            })?;

        if !outcome.success {
            return Ok(Json(Accepted {
                message: outcome.message,
                success: false,
            }));
        }
    }

    Ok(Json(Accepted {
        message: NEWSLETTER_SUCCESS_MESSAGE.to_string(),
        success: true,
    }))
}

/// Handle OPTIONS preflight for the form endpoints.
pub async fn handle_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

/// Handle GET /api/health.
///
/// Probes the CMS when forwarding is enabled.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    let health = match state.cms() {
        Some(cms) => cms.health_check().await,
        None => HealthStatus {
            status: HealthState::Ok,
            message: "Forms service is running".to_string(),
        },
    };

    let status = match health.status {
        HealthState::Ok => StatusCode::OK,
        HealthState::Error => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(health)).into_response()
}

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Submission rejected (400)
    Invalid(ValidationError),
    /// Unexpected failure (500) with a fixed user-facing message
    Internal(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Invalid(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Invalid(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state() -> State<Arc<AppState>> {
        State(Arc::new(AppState::default()))
    }

    #[tokio::test]
    async fn test_contact_accepted() {
        let body = Bytes::from_static(
            br#"{"name":"Ada","email":"ada@example.com","subject":"Visa","serviceType":"visa","message":"Please call me back"}"#,
        );

        let Json(accepted) = handle_contact(state(), body).await.expect("Operation should succeed");

        assert!(accepted.success);
        assert_eq!(accepted.message, CONTACT_SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_contact_missing_fields() {
        let body = Bytes::from_static(br#"{"name":"Ada","email":"ada@example.com"}"#);

        let err = handle_contact(state(), body).await.expect_err("should be rejected");

        assert!(matches!(
            err,
            AppError::Invalid(ValidationError::MissingFields(ref fields))
                if fields == &["subject", "serviceType", "message"]
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contact_malformed_body() {
        let err = handle_contact(state(), Bytes::from_static(b"name=Ada"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, AppError::Internal(CONTACT_FAILURE_MESSAGE)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_newsletter_accepted() {
        let body = Bytes::from_static(br#"{"email":"reader@example.com"}"#);

        let Json(accepted) = handle_newsletter(state(), body).await.expect("Operation should succeed");

        assert!(accepted.success);
        assert_eq!(accepted.message, NEWSLETTER_SUCCESS_MESSAGE);
    }

    #[tokio::test]
    async fn test_health_without_cms() {
        let response = handle_health(state()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_preflight_headers() {
        let response = handle_preflight().await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }
}
