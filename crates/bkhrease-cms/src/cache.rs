//! Query cache over the content service
//!
//! Results are memoized per (resource, parameters) and served only while
//! they are inside the resource's staleness window. The cache has its own
//! retry counter on top of the transport retry policy; client errors are
//! never retried at this level.
//!
//! The store is a [`DashMap`]. No map guard is ever held across an
//! `.await`. Two concurrent misses on the same key both fetch and the
//! later result wins. Expired entries are dropped whenever a new result is
//! stored and by an optional periodic sweep; the store never holds more
//! than `max_entries` results.

use dashmap::DashMap;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::Result;
use crate::model::{
    BlogPost, Category, ContactForm, HomepageContent, NewsItem, NewsType, NewsletterList, Page,
    Service, SubmissionOutcome, TeamCategory, TeamMember,
};
use crate::service::{ContentService, DEFAULT_PAGE_SIZE};

/// Cached resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Homepage,
    TeamMembers,
    TeamMembersByCategory,
    BlogPosts,
    BlogPost,
    BlogPostsByCategory,
    BlogCategories,
    BlogSearch,
    NewsUpdates,
    NewsItem,
    NewsByType,
    UpcomingEvents,
    Services,
    Service,
}

/// Groups of resources invalidated together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceFamily {
    Homepage,
    Team,
    Blog,
    News,
    Services,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Self::Homepage => "homepage",
            Self::TeamMembers => "team-members",
            Self::TeamMembersByCategory => "team-members-by-category",
            Self::BlogPosts => "blog-posts",
            Self::BlogPost => "blog-post",
            Self::BlogPostsByCategory => "blog-posts-by-category",
            Self::BlogCategories => "blog-categories",
            Self::BlogSearch => "blog-search",
            Self::NewsUpdates => "news-updates",
            Self::NewsItem => "news-item",
            Self::NewsByType => "news-by-type",
            Self::UpcomingEvents => "upcoming-events",
            Self::Services => "services",
            Self::Service => "service",
        }
    }

    pub fn family(self) -> ResourceFamily {
        match self {
            Self::Homepage => ResourceFamily::Homepage,
            Self::TeamMembers | Self::TeamMembersByCategory => ResourceFamily::Team,
            Self::BlogPosts
            | Self::BlogPost
            | Self::BlogPostsByCategory
            | Self::BlogCategories
            | Self::BlogSearch => ResourceFamily::Blog,
            Self::NewsUpdates | Self::NewsItem | Self::NewsByType | Self::UpcomingEvents => {
                ResourceFamily::News
            }
            Self::Services | Self::Service => ResourceFamily::Services,
        }
    }
}

impl CacheConfig {
    /// Staleness window for a resource
    pub fn stale_time(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Homepage => self.homepage,
            Resource::TeamMembers | Resource::TeamMembersByCategory => self.team_members,
            Resource::BlogPosts | Resource::BlogPostsByCategory => self.blog_listing,
            Resource::BlogPost => self.blog_post,
            Resource::BlogCategories => self.categories,
            Resource::BlogSearch => self.search,
            Resource::NewsUpdates | Resource::NewsByType => self.news_listing,
            Resource::NewsItem => self.news_item,
            Resource::UpcomingEvents => self.upcoming_events,
            Resource::Services | Resource::Service => self.services,
        }
    }
}

/// Cache key: resource plus its serialized arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: Resource,
    params: String,
}

impl QueryKey {
    pub fn new(resource: Resource, params: impl Serialize) -> Self {
        Self {
            resource,
            params: serde_json::to_string(&params).unwrap_or_default(),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource.name(), self.params)
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale_time: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.stale_time
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

pub struct QueryCache {
    entries: DashMap<QueryKey, CacheEntry>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fresh cached value for `key`, if any
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if !entry.is_fresh() {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Store a value with the resource's staleness window
    pub fn insert<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let stale_time = self.config.stale_time(key.resource());
        self.evict_expired();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
                stale_time,
            },
        );
    }

    /// Drop every entry past its staleness window. Returns how many went.
    pub fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "Expired cache entries evicted");
        }
        removed
    }

    /// Make room for one entry by dropping the oldest down to 90% capacity
    fn evict_oldest(&self) {
        let max_entries = self.config.max_entries;
        let target = (max_entries * 90 / 100).min(max_entries.saturating_sub(1));
        let excess = self.entries.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        let mut candidates: Vec<(QueryKey, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fetched_at))
            .collect();
        candidates.sort_by_key(|(_, fetched_at)| *fetched_at);

        let mut removed = 0_u64;
        for (key, _) in candidates.into_iter().take(excess) {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        self.evictions.fetch_add(removed, Ordering::Relaxed);
        debug!(removed, max_entries, "Cache full, oldest entries evicted");
    }

    /// Start the periodic sweep of expired entries.
    pub fn spawn_sweeper(self: &Arc<Self>) -> RefreshHandle {
        let cache = Arc::clone(self);
        let period = self.config.sweep_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                cache.evict_expired();
            }
        });

        RefreshHandle { handle }
    }

    /// Serve a fresh entry or run `fetcher` and store its result.
    ///
    /// Failures are returned and never stored.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "Cache miss");
        self.load(key, fetcher).await
    }

    /// Run `fetcher` regardless of freshness and store its result.
    pub async fn refetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!(key = %key, "Forced refetch");
        self.load(key, fetcher).await
    }

    async fn load<T, F, Fut>(&self, key: QueryKey, mut fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures = 0;
        loop {
            match fetcher().await {
                Ok(value) => {
                    self.insert(key, value.clone());
                    return Ok(value);
                }
                Err(e) if e.is_client_error() || failures >= self.config.query_retries => {
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.retry_delay(failures);
                    failures += 1;
                    warn!(
                        key = %key,
                        failures,
                        delay_ms = delay.as_millis() as u64,
                        "Query failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Delay before the retry that follows `failures` earlier failures.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        let factor = 1_u32.checked_shl(failures).unwrap_or(u32::MAX);
        self.config
            .query_retry_base_delay
            .saturating_mul(factor)
            .min(self.config.query_retry_max_delay)
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "Cache entry invalidated");
        }
        removed
    }

    /// Drop every entry of a resource, whatever its parameters.
    pub fn invalidate_resource(&self, resource: Resource) -> usize {
        self.remove_matching(|key| key.resource == resource)
    }

    /// Drop every entry of a resource family.
    pub fn invalidate_family(&self, family: ResourceFamily) -> usize {
        self.remove_matching(|key| key.resource.family() == family)
    }

    fn remove_matching(&self, matches: impl Fn(&QueryKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !matches(key));
        let removed = before.saturating_sub(self.entries.len());
        debug!(removed, "Cache entries invalidated");
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

/// Handle of a periodic cache task. Dropping it stops the task.
#[derive(Debug)]
pub struct RefreshHandle {
    handle: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// [`ContentService`] with every read memoized in a [`QueryCache`]
#[derive(Debug, Clone)]
pub struct CachedContentService {
    service: Arc<ContentService>,
    cache: Arc<QueryCache>,
}

impl CachedContentService {
    pub fn new(service: Arc<ContentService>, cache: Arc<QueryCache>) -> Self {
        Self { service, cache }
    }

    /// Wrap a service with a cache using the default windows
    pub fn with_defaults(service: ContentService) -> Self {
        Self::new(Arc::new(service), Arc::new(QueryCache::default()))
    }

    pub fn service(&self) -> &Arc<ContentService> {
        &self.service
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub async fn get_homepage(&self) -> Result<HomepageContent> {
        self.cache
            .fetch(QueryKey::new(Resource::Homepage, ()), || {
                self.service.get_homepage()
            })
            .await
    }

    pub async fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        self.cache
            .fetch(QueryKey::new(Resource::TeamMembers, ()), || {
                self.service.list_team_members()
            })
            .await
    }

    pub async fn list_team_members_by_category(
        &self,
        category: TeamCategory,
    ) -> Result<Vec<TeamMember>> {
        self.cache
            .fetch(
                QueryKey::new(Resource::TeamMembersByCategory, category),
                || self.service.list_team_members_by_category(category),
            )
            .await
    }

    pub async fn list_blog_posts(&self, page: u32, page_size: u32) -> Result<Page<BlogPost>> {
        self.cache
            .fetch(QueryKey::new(Resource::BlogPosts, (page, page_size)), || {
                self.service.list_blog_posts(page, page_size)
            })
            .await
    }

    /// First page with the default page size
    pub async fn list_recent_blog_posts(&self) -> Result<Page<BlogPost>> {
        self.list_blog_posts(1, DEFAULT_PAGE_SIZE).await
    }

    pub async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Vec<BlogPost>> {
        self.cache
            .fetch(QueryKey::new(Resource::BlogPost, slug), || {
                self.service.get_blog_post_by_slug(slug)
            })
            .await
    }

    pub async fn list_blog_posts_by_category(
        &self,
        category_slug: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BlogPost>> {
        self.cache
            .fetch(
                QueryKey::new(Resource::BlogPostsByCategory, (category_slug, page, page_size)),
                || {
                    self.service
                        .list_blog_posts_by_category(category_slug, page, page_size)
                },
            )
            .await
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.cache
            .fetch(QueryKey::new(Resource::BlogCategories, ()), || {
                self.service.list_categories()
            })
            .await
    }

    pub async fn search_blog_posts(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BlogPost>> {
        self.cache
            .fetch(
                QueryKey::new(Resource::BlogSearch, (query.trim(), page, page_size)),
                || self.service.search_blog_posts(query, page, page_size),
            )
            .await
    }

    pub async fn list_news_updates(&self, limit: Option<u32>) -> Result<Vec<NewsItem>> {
        self.cache
            .fetch(QueryKey::new(Resource::NewsUpdates, limit), || {
                self.service.list_news_updates(limit)
            })
            .await
    }

    pub async fn get_news_item_by_slug(&self, slug: &str) -> Result<Vec<NewsItem>> {
        self.cache
            .fetch(QueryKey::new(Resource::NewsItem, slug), || {
                self.service.get_news_item_by_slug(slug)
            })
            .await
    }

    pub async fn list_news_by_type(&self, kind: NewsType) -> Result<Vec<NewsItem>> {
        self.cache
            .fetch(QueryKey::new(Resource::NewsByType, kind), || {
                self.service.list_news_by_type(kind)
            })
            .await
    }

    pub async fn list_upcoming_events(&self) -> Result<Vec<NewsItem>> {
        self.cache
            .fetch(QueryKey::new(Resource::UpcomingEvents, ()), || {
                self.service.list_upcoming_events()
            })
            .await
    }

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        self.cache
            .fetch(QueryKey::new(Resource::Services, ()), || {
                self.service.list_services()
            })
            .await
    }

    pub async fn get_service_by_id(&self, id: u64) -> Result<Service> {
        self.cache
            .fetch(QueryKey::new(Resource::Service, id), || {
                self.service.get_service_by_id(id)
            })
            .await
    }

    /// Pass-through; writes do not touch the cache.
    pub async fn submit_contact_form(&self, form: &ContactForm) -> Result<SubmissionOutcome> {
        self.service.submit_contact_form(form).await
    }

    /// Pass-through; writes do not touch the cache.
    pub async fn subscribe_to_newsletter(
        &self,
        email: &str,
        list: NewsletterList,
    ) -> Result<SubmissionOutcome> {
        self.service.subscribe_to_newsletter(email, list).await
    }

    /// Warm the cache for a post page before it is opened
    pub async fn prefetch_blog_post(&self, slug: &str) -> Result<()> {
        self.get_blog_post_by_slug(slug).await.map(|_| ())
    }

    /// Warm the cache for a news page before it is opened
    pub async fn prefetch_news_item(&self, slug: &str) -> Result<()> {
        self.get_news_item_by_slug(slug).await.map(|_| ())
    }

    /// Invalidate the data shown on landing pages: homepage, news updates
    /// and upcoming events.
    pub fn refetch_critical_data(&self) -> usize {
        let removed = self.cache.invalidate_resource(Resource::Homepage)
            + self.cache.invalidate_resource(Resource::NewsUpdates)
            + self.cache.invalidate_resource(Resource::UpcomingEvents);
        info!(removed, "Critical data invalidated");
        removed
    }

    /// Reload upcoming events now, ignoring freshness
    pub async fn refresh_upcoming_events(&self) -> Result<Vec<NewsItem>> {
        self.cache
            .refetch(QueryKey::new(Resource::UpcomingEvents, ()), || {
                self.service.list_upcoming_events()
            })
            .await
    }

    /// Start the periodic upcoming-events refresh.
    pub fn spawn_upcoming_events_refresh(self: &Arc<Self>) -> RefreshHandle {
        let this = Arc::clone(self);
        let period = self
            .cache
            .config()
            .upcoming_refresh_interval
            .max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match this.refresh_upcoming_events().await {
                    Ok(events) => debug!(count = events.len(), "Upcoming events refreshed"),
                    Err(e) => warn!(status = e.status(), "Upcoming events refresh failed: {e}"),
                }
            }
        });

        RefreshHandle { handle }
    }
}
