//! Form endpoints for the B.Khrease site.
//!
//! Serves the contact and newsletter submissions the site's forms post to:
//! - `POST /api/contact`: validated contact inquiry
//! - `POST /api/newsletter`: newsletter signup
//! - `OPTIONS` on both for CORS preflight
//! - `GET /api/health`: liveness, and CMS reachability when forwarding
//!
//! Accepted submissions are logged. With forwarding enabled they are also
//! stored in the CMS through [`bkhrease_cms::ContentService`].
//!
//! # Example
//!
//! ```no_run
//! use bkhrease_forms::{FormsConfig, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = FormsConfig::from_args();
//!     config.validate()?;
//!
//!     Server::new(config)?.run().await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod validation;

pub use config::FormsConfig;
pub use error::{BodyError, ConfigError, ServerError, ValidationError};
pub use server::{AppState, Server};
