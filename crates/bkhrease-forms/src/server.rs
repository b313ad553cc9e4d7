//! Server state and orchestration.

use bkhrease_cms::ContentService;
use std::sync::Arc;

use crate::config::FormsConfig;
use crate::error::ServerError;

/// Shared state of the form handlers.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// CMS client, present when forwarding is enabled
    cms: Option<Arc<ContentService>>,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: &FormsConfig) -> Result<Self, ServerError> {
        if !config.forward {
            tracing::info!("CMS forwarding disabled, submissions are logged only");
            return Ok(Self::default());
        }

        let service = ContentService::new(config.cms_config())?;
        tracing::info!(cms_url = %config.cms_url, "CMS forwarding enabled");
        Ok(Self::with_cms(Arc::new(service)))
    }

    /// State that forwards submissions to the given service
    pub fn with_cms(service: Arc<ContentService>) -> Self {
        Self { cms: Some(service) }
    }

    pub fn cms(&self) -> Option<&Arc<ContentService>> {
        self.cms.as_ref()
    }
}

/// Server orchestration.
pub struct Server {
    state: Arc<AppState>,
    config: FormsConfig,
}

impl Server {
    pub fn new(config: FormsConfig) -> Result<Self, ServerError> {
        let state = AppState::new(&config)?;
        Ok(Self {
            state: Arc::new(state),
            config,
        })
    }

    /// Run the HTTP listener until interrupted or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Starting B.Khrease forms service");
        tracing::info!("HTTP server binding to: {}", self.config.bind);

        let state = Arc::clone(&self.state);
        let bind = self.config.bind;
        let http_server = tokio::spawn(crate::http::start_server(bind, state));

        tokio::select! {
            result = http_server => {
                return match result {
                    Ok(outcome) => outcome,
                    Err(e) => Err(ServerError::Shutdown(format!("HTTP server task failed: {e}"))),
                };
            }
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|e| {
                    ServerError::Shutdown(format!("Failed to listen for shutdown signal: {e}"))
                })?;
            }
        }

        tracing::info!("Shutdown signal received, stopping server");
        Ok(())
    }

    #[cfg(test)]
    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_state_without_forwarding() {
        let server = Server::new(FormsConfig::default()).expect("Operation should succeed");
        assert!(server.state().cms().is_none());
    }

    #[test]
    fn test_state_with_forwarding() {
        let config = FormsConfig {
            forward: true,
            cms_url: "http://127.0.0.1:1337".to_string(),
            cms_token: Some("token".to_string()),
            ..FormsConfig::default()
        };

        let state = AppState::new(&config).expect("Operation should succeed");
        let cms = state.cms().expect("forwarding should create a CMS client");
        assert_eq!(cms.config().base_url, "http://127.0.0.1:1337");
    }
}
