//! Forms service configuration.
//!
//! Configuration can be provided via:
//! - CLI arguments (`--bind`, `--forward`, etc.)
//! - Environment variables (`BKHREASE_FORMS_BIND`, `NEXT_PUBLIC_STRAPI_URL`, etc.)
//! - Default values
//!
//! # Example
//!
//! ```no_run
//! use bkhrease_forms::FormsConfig;
//!
//! let config = FormsConfig::from_args();
//! config.validate().expect("Invalid configuration");
//!
//! println!("Forms service will bind to: {}", config.bind);
//! println!("Forwarding to CMS: {}", config.forward);
//! ```

use bkhrease_cms::CmsConfig;
use bkhrease_cms::config::DEFAULT_BASE_URL;
use clap::Parser;
use std::net::SocketAddr;

use crate::error::ConfigError;

/// Server configuration loaded from CLI args and environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bkhrease-forms",
    about = "Contact and newsletter endpoints for the B.Khrease site",
    version
)]
pub struct FormsConfig {
    /// HTTP bind address
    #[arg(long, env = "BKHREASE_FORMS_BIND", default_value = "0.0.0.0:3001")]
    pub bind: SocketAddr,

    /// Store accepted submissions in the CMS
    #[arg(long, env = "BKHREASE_FORMS_FORWARD")]
    pub forward: bool,

    /// CMS base URL used when forwarding
    #[arg(long, env = "NEXT_PUBLIC_STRAPI_URL", default_value = DEFAULT_BASE_URL)]
    pub cms_url: String,

    /// CMS API token used when forwarding
    #[arg(long, env = "STRAPI_API_TOKEN", hide_env_values = true)]
    pub cms_token: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "BKHREASE_FORMS_LOG_JSON")]
    pub log_json: bool,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3001)),
            forward: false,
            cms_url: DEFAULT_BASE_URL.to_string(),
            cms_token: None,
            log_json: false,
        }
    }
}

impl FormsConfig {
    /// Parse configuration from command-line arguments.
    #[must_use]
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// CMS client settings. Timeout and retry tuning still come from the
    /// environment.
    pub fn cms_config(&self) -> CmsConfig {
        let mut config = CmsConfig::from_env();
        config.base_url.clone_from(&self.cms_url);
        config.token = self.cms_token.clone().filter(|token| !token.is_empty());
        config
    }

    /// Validate configuration.
    ///
    /// CMS settings are only checked when forwarding is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.forward {
            return Ok(());
        }

        let report = self.cms_config().validate();
        if report.is_valid {
            Ok(())
        } else {
            Err(ConfigError::Cms(report.errors))
        }
    }
}
