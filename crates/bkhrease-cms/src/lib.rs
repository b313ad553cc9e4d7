//! Content layer for the B.Khrease site.
//!
//! This crate talks to the Strapi CMS that backs the site and hands out
//! flat, typed domain objects:
//! - `transport`: one HTTP attempt with timeout, bearer token and logging
//! - `retry`: linear backoff over retryable failures
//! - `error` / `translate`: the error type and its user-facing sentences
//! - `service`: one method per collection, plus contact and newsletter writes
//! - `cache`: per-resource staleness windows over the service
//!
//! # Example
//!
//! ```no_run
//! use bkhrease_cms::{CachedContentService, CmsConfig, ContentService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bkhrease_cms::ApiError> {
//!     let service = ContentService::new(CmsConfig::from_env())?;
//!     let cms = CachedContentService::with_defaults(service);
//!
//!     let posts = cms.list_blog_posts(1, 10).await?;
//!     for post in &posts.items {
//!         println!("{} ({})", post.title, post.slug);
//!     }
//!
//!     // Served from the cache for the next five minutes
//!     let _again = cms.list_blog_posts(1, 10).await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod query;
pub mod retry;
pub mod service;
pub mod translate;
pub mod transport;
pub mod wire;

pub use cache::{
    CacheStats, CachedContentService, QueryCache, QueryKey, RefreshHandle, Resource, ResourceFamily,
};
pub use config::{CacheConfig, CmsConfig, ConfigValidation};
pub use error::{ApiError, ErrorOrigin, Result};
pub use model::{
    BlogPost, Category, ContactForm, ContentItem, HealthState, HealthStatus, HomepageContent,
    MediaReference, NewsItem, NewsType, NewsletterList, Page, Pagination, RichText, Service,
    SubmissionOutcome, TeamCategory, TeamMember,
};
pub use retry::RetryPolicy;
pub use service::ContentService;
pub use translate::{HandledError, user_message};
pub use transport::{CmsRequest, HttpTransport, Transport};
