//! Typed access to the CMS collections
//!
//! Every read method builds its query, runs the request through the retry
//! policy and flattens the response with the matching normalizer. The
//! service keeps no state between calls.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{CmsConfig, ConfigValidation};
use crate::error::{ApiError, ErrorOrigin, Result};
use crate::model::{
    BlogPost, Category, ContactForm, HealthState, HealthStatus, HomepageContent, NewsItem,
    NewsType, NewsletterList, Page, Service, SubmissionOutcome, TeamCategory, TeamMember,
};
use crate::normalize;
use crate::query::{Query, SortOrder};
use crate::retry::RetryPolicy;
use crate::transport::{CmsRequest, HttpTransport, Transport};
use crate::wire::{Entity, Envelope, HomepageAttributes, NewsItemAttributes, ServiceAttributes};

/// Page size used when a caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub const CONTACT_SUCCESS_MESSAGE: &str =
    "Your message has been sent successfully. We will get back to you soon!";
pub const NEWSLETTER_SUCCESS_MESSAGE: &str = "Successfully subscribed to our newsletter!";
pub const NEWSLETTER_DUPLICATE_MESSAGE: &str =
    "This email is already subscribed to our newsletter.";

/// Client for the CMS content collections
pub struct ContentService {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    config: CmsConfig,
}

impl std::fmt::Debug for ContentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentService")
            .field("base_url", &self.config.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ContentService {
    /// Create a service talking HTTP to the configured CMS
    pub fn new(config: CmsConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        info!(base_url = %config.base_url, "CMS client initialized");
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a service from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(CmsConfig::from_env())
    }

    /// Create a service over a custom transport
    pub fn with_transport(config: CmsConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry: config.retry_policy.clone(),
            config,
        }
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    /// Run one logical request through the retry policy.
    async fn send(&self, request: CmsRequest) -> Result<Value> {
        let transport = self.transport.as_ref();
        let request = &request;
        self.retry
            .execute(|_| transport.execute(request))
            .await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: CmsRequest) -> Result<T> {
        let endpoint = request.endpoint.clone();
        let value = self.send(request).await?;
        serde_json::from_value(value).map_err(|e| {
            error!(endpoint = %endpoint, "Unexpected CMS response shape: {e}");
            ApiError::unknown(e)
        })
    }

    async fn fetch_list<A, T>(
        &self,
        endpoint: String,
        normalize: impl Fn(Entity<A>) -> T,
    ) -> Result<Page<T>>
    where
        A: DeserializeOwned,
    {
        let envelope: Envelope<Vec<Value>> =
            self.fetch(CmsRequest::get(endpoint.clone())).await?;
        let pagination = envelope.pagination();
        Ok(Page {
            items: decode_entities(&endpoint, envelope.data)
                .into_iter()
                .map(normalize)
                .collect(),
            pagination,
        })
    }

    // Homepage

    pub async fn get_homepage(&self) -> Result<HomepageContent> {
        let endpoint = Query::new().populate_all().endpoint("homepage");
        let envelope: Envelope<Entity<HomepageAttributes>> = self
            .fetch(CmsRequest::get(endpoint))
            .await
            .inspect_err(|e| error!("Failed to fetch homepage data: {e}"))?;
        Ok(normalize::homepage(envelope.data))
    }

    // Team

    /// All team members in listing order
    pub async fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        let endpoint = Query::new()
            .populate_all()
            .sort("order", SortOrder::Asc)
            .endpoint("team-members");
        self.team_members(endpoint)
            .await
            .inspect_err(|e| error!("Failed to fetch team members: {e}"))
    }

    pub async fn list_team_members_by_category(
        &self,
        category: TeamCategory,
    ) -> Result<Vec<TeamMember>> {
        let endpoint = Query::new()
            .populate_all()
            .filter("category", "$eq", category)
            .sort("order", SortOrder::Asc)
            .endpoint("team-members");
        self.team_members(endpoint)
            .await
            .inspect_err(|e| error!(%category, "Failed to fetch team members by category: {e}"))
    }

    async fn team_members(&self, endpoint: String) -> Result<Vec<TeamMember>> {
        let mut members = self.fetch_list(endpoint, normalize::team_member).await?.items;
        members.sort_by(TeamMember::listing_cmp);
        Ok(members)
    }

    // Blog

    pub async fn list_blog_posts(&self, page: u32, page_size: u32) -> Result<Page<BlogPost>> {
        check_pagination(page, page_size)?;
        let endpoint = Query::new()
            .populate_all()
            .page(page)
            .page_size(page_size)
            .sort("publishedAt", SortOrder::Desc)
            .endpoint("blog-posts");
        self.fetch_list(endpoint, normalize::blog_post)
            .await
            .inspect_err(|e| error!(page, page_size, "Failed to fetch blog posts: {e}"))
    }

    /// Zero or one post; an unknown slug is not an error.
    pub async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Vec<BlogPost>> {
        if slug.is_empty() {
            return Err(ApiError::invalid_request("Blog post slug is required"));
        }
        let endpoint = Query::new()
            .filter("slug", "$eq", slug)
            .populate_all()
            .endpoint("blog-posts");
        Ok(self
            .fetch_list(endpoint, normalize::blog_post)
            .await
            .inspect_err(|e| error!(slug, "Failed to fetch blog post: {e}"))?
            .items)
    }

    pub async fn list_blog_posts_by_category(
        &self,
        category_slug: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BlogPost>> {
        if category_slug.is_empty() {
            return Err(ApiError::invalid_request("Category slug is required"));
        }
        check_pagination(page, page_size)?;
        let endpoint = Query::new()
            .populate_all()
            .filter_path(&["categories", "slug"], "$eq", category_slug)
            .page(page)
            .page_size(page_size)
            .sort("publishedAt", SortOrder::Desc)
            .endpoint("blog-posts");
        self.fetch_list(endpoint, normalize::blog_post)
            .await
            .inspect_err(|e| error!(category_slug, "Failed to fetch blog posts by category: {e}"))
    }

    /// Categories sorted by name
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let endpoint = Query::new()
            .sort("name", SortOrder::Asc)
            .endpoint("categories");
        Ok(self
            .fetch_list(endpoint, normalize::category)
            .await
            .inspect_err(|e| error!("Failed to fetch blog categories: {e}"))?
            .items)
    }

    /// Case-insensitive match on title, excerpt and content
    pub async fn search_blog_posts(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BlogPost>> {
        let term = query.trim();
        if term.is_empty() {
            return Err(ApiError::invalid_request("Search query is required"));
        }
        check_pagination(page, page_size)?;
        let endpoint = Query::new()
            .populate_all()
            .filter_path(&["$or", "0", "title"], "$containsi", term)
            .filter_path(&["$or", "1", "excerpt"], "$containsi", term)
            .filter_path(&["$or", "2", "content"], "$containsi", term)
            .page(page)
            .page_size(page_size)
            .sort("publishedAt", SortOrder::Desc)
            .endpoint("blog-posts");
        self.fetch_list(endpoint, normalize::blog_post)
            .await
            .inspect_err(|e| error!(query = term, "Failed to search blog posts: {e}"))
    }

    // News

    pub async fn list_news_updates(&self, limit: Option<u32>) -> Result<Vec<NewsItem>> {
        let mut query = Query::new()
            .populate_all()
            .sort("publishedAt", SortOrder::Desc);
        if let Some(limit) = limit.filter(|l| *l > 0) {
            query = query.page_size(limit);
        }
        self.news_items(query.endpoint("news-items"), Utc::now())
            .await
            .inspect_err(|e| error!("Failed to fetch news updates: {e}"))
    }

    /// Zero or one item; an unknown slug is not an error.
    pub async fn get_news_item_by_slug(&self, slug: &str) -> Result<Vec<NewsItem>> {
        if slug.is_empty() {
            return Err(ApiError::invalid_request("News item slug is required"));
        }
        let endpoint = Query::new()
            .filter("slug", "$eq", slug)
            .populate_all()
            .endpoint("news-items");
        self.news_items(endpoint, Utc::now())
            .await
            .inspect_err(|e| error!(slug, "Failed to fetch news item: {e}"))
    }

    pub async fn list_news_by_type(&self, kind: NewsType) -> Result<Vec<NewsItem>> {
        let endpoint = Query::new()
            .populate_all()
            .filter("type", "$eq", kind)
            .sort("publishedAt", SortOrder::Desc)
            .endpoint("news-items");
        self.news_items(endpoint, Utc::now())
            .await
            .inspect_err(|e| error!(%kind, "Failed to fetch news items by type: {e}"))
    }

    /// Events dated now or later, soonest first
    pub async fn list_upcoming_events(&self) -> Result<Vec<NewsItem>> {
        let now = Utc::now();
        let endpoint = Query::new()
            .populate_all()
            .filter("type", "$eq", NewsType::Event)
            .filter("eventDate", "$gte", now.to_rfc3339_opts(SecondsFormat::Millis, true))
            .sort("eventDate", SortOrder::Asc)
            .endpoint("news-items");
        self.news_items(endpoint, now)
            .await
            .inspect_err(|e| error!("Failed to fetch upcoming events: {e}"))
    }

    async fn news_items(&self, endpoint: String, now: DateTime<Utc>) -> Result<Vec<NewsItem>> {
        Ok(self
            .fetch_list(endpoint, |entity: Entity<NewsItemAttributes>| {
                normalize::news_item(entity, now)
            })
            .await?
            .items)
    }

    // Services

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let endpoint = Query::new()
            .populate_all()
            .sort("order", SortOrder::Asc)
            .endpoint("services");
        Ok(self
            .fetch_list(endpoint, normalize::service)
            .await
            .inspect_err(|e| error!("Failed to fetch services: {e}"))?
            .items)
    }

    pub async fn get_service_by_id(&self, id: u64) -> Result<Service> {
        if id == 0 {
            return Err(ApiError::invalid_request("Valid service ID is required"));
        }
        let endpoint = Query::new()
            .populate_all()
            .endpoint(&format!("services/{id}"));
        let envelope: Envelope<Entity<ServiceAttributes>> = self
            .fetch(CmsRequest::get(endpoint))
            .await
            .inspect_err(|e| error!(id, "Failed to fetch service: {e}"))?;
        Ok(normalize::service(envelope.data))
    }

    // Write paths

    pub async fn submit_contact_form(&self, form: &ContactForm) -> Result<SubmissionOutcome> {
        if form.name.is_empty() || form.email.is_empty() || form.message.is_empty() {
            return Err(ApiError::invalid_request(
                "Name, email, and message are required",
            ));
        }

        let request = CmsRequest::post("/contact-submissions", json!({ "data": form }));
        self.send(request)
            .await
            .inspect_err(|e| error!("Failed to submit contact form: {e}"))?;

        info!(email = %form.email, "Contact submission stored");
        Ok(SubmissionOutcome {
            success: true,
            message: CONTACT_SUCCESS_MESSAGE.to_string(),
        })
    }

    /// Subscribe an email address; repeating a subscription is not an error.
    pub async fn subscribe_to_newsletter(
        &self,
        email: &str,
        list: NewsletterList,
    ) -> Result<SubmissionOutcome> {
        if !email.contains('@') {
            return Err(ApiError::invalid_request("Valid email address is required"));
        }

        let email = email.trim().to_lowercase();
        let body = json!({
            "data": {
                "email": email,
                "type": list,
                "subscribedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }
        });

        match self
            .send(CmsRequest::post("/newsletter-subscriptions", body))
            .await
        {
            Ok(_) => {
                info!(email = %email, ?list, "Newsletter subscription stored");
                Ok(SubmissionOutcome {
                    success: true,
                    message: NEWSLETTER_SUCCESS_MESSAGE.to_string(),
                })
            }
            Err(e) if is_duplicate_subscription(&e) => {
                debug!(email = %email, "Newsletter subscription already exists");
                Ok(SubmissionOutcome {
                    success: false,
                    message: NEWSLETTER_DUPLICATE_MESSAGE.to_string(),
                })
            }
            Err(e) => {
                error!("Failed to subscribe to newsletter: {e}");
                Err(e)
            }
        }
    }

    // Diagnostics

    /// Probe the CMS. Never fails; the outcome is reported in the status.
    pub async fn health_check(&self) -> HealthStatus {
        match self.send(CmsRequest::get("/health-check")).await {
            Ok(_) => HealthStatus {
                status: HealthState::Ok,
                message: "Strapi API is accessible".to_string(),
            },
            Err(e) => HealthStatus {
                status: HealthState::Error,
                message: e.message().to_string(),
            },
        }
    }

    pub fn validate_configuration(&self) -> ConfigValidation {
        self.config.validate()
    }
}

fn check_pagination(page: u32, page_size: u32) -> Result<()> {
    if page == 0 {
        return Err(ApiError::invalid_request("Page must be at least 1"));
    }
    if page_size == 0 {
        return Err(ApiError::invalid_request("Page size must be greater than 0"));
    }
    Ok(())
}

/// Decode list entries one by one, dropping the ones that do not match
/// the collection schema so a single bad entry cannot hide the rest.
fn decode_entities<A: DeserializeOwned>(endpoint: &str, data: Vec<Value>) -> Vec<Entity<A>> {
    data.into_iter()
        .filter_map(|item| {
            let id = item.get("id").and_then(Value::as_u64);
            serde_json::from_value(item)
                .inspect_err(|e| warn!(endpoint, ?id, "Skipping malformed CMS entry: {e}"))
                .ok()
        })
        .collect()
}

/// Whether a rejected subscription means the address is already on file.
///
/// Only a 400 from the CMS whose error messages mention a uniqueness
/// violation counts. Other 400s are real failures.
pub fn is_duplicate_subscription(error: &ApiError) -> bool {
    if error.status() != 400 || error.origin() != ErrorOrigin::Response {
        return false;
    }

    let mut messages = vec![error.message().to_string()];
    if let Some(details) = error.details() {
        if let Some(errors) = details
            .pointer("/error/details/errors")
            .and_then(Value::as_array)
        {
            messages.extend(
                errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .map(str::to_string),
            );
        }
    }

    messages.iter().any(|m| {
        let m = m.to_lowercase();
        m.contains("unique") || m.contains("already")
    })
}
