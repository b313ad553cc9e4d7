//! HTTP transport for the CMS REST API
//!
//! [`Transport`] issues exactly one attempt per call. Retrying is layered on
//! top by [`RetryPolicy`](crate::retry::RetryPolicy), and tests swap the
//! HTTP implementation for scripted ones through the trait.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method, Response};
use serde_json::Value;
use std::sync::Once;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::CmsConfig;
use crate::error::{ApiError, Result};

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring provider for rustls once per process.
pub(crate) fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Another component may already have installed one
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// One request against the CMS, relative to `<base>/api`
#[derive(Debug, Clone, PartialEq)]
pub struct CmsRequest {
    pub method: Method,
    /// Path plus query string, starting with `/`
    pub endpoint: String,
    pub body: Option<Value>,
}

impl CmsRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            endpoint: endpoint.into(),
            body: Some(body),
        }
    }
}

/// A single attempt against the CMS.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the decoded JSON body.
    async fn execute(&self, request: &CmsRequest) -> Result<Value>;
}

/// [`Transport`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &CmsConfig) -> Result<Self> {
        ensure_crypto_provider();

        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(config.request_timeout)
            .tcp_nodelay(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .user_agent(concat!("bkhrease-cms/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::unknown)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            timeout: config.request_timeout,
        })
    }

    /// Full URL for an endpoint
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/api{}", self.base_url, endpoint)
    }

    fn classify(&self, error: &reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::timeout(self.timeout)
        } else if error.is_builder() {
            ApiError::unknown(error)
        } else {
            ApiError::network(error)
        }
    }

    async fn read_response(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify(&e))?;

        if status.is_success() {
            if body.is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_slice(&body).map_err(ApiError::unknown);
        }

        let parsed = serde_json::from_slice::<Value>(&body).ok();
        Err(ApiError::from_response(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status"),
            parsed,
        ))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: &CmsRequest) -> Result<Value> {
        let started = Instant::now();
        let url = self.url_for(&request.endpoint);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .timeout(self.timeout)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body).map_err(ApiError::unknown)?);
        }

        let (status, outcome) = match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                (status, self.read_response(response).await)
            }
            Err(e) => {
                let err = self.classify(&e);
                (err.status(), Err(err))
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => debug!(
                method = %request.method,
                endpoint = %request.endpoint,
                status,
                duration_ms,
                "CMS request completed"
            ),
            Err(e) => warn!(
                method = %request.method,
                endpoint = %request.endpoint,
                status = e.status(),
                duration_ms,
                "CMS request failed: {e}"
            ),
        }

        outcome
    }
}
