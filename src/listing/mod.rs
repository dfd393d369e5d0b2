//! Listing state machine for browsing and searching publications.
//!
//! [`ListingController`] owns the state a publication listing needs: the
//! current page of items, the page position, the active mode (browsing the
//! whole corpus or searching it) and the query text. Every mutating
//! operation ends by resolving the current (query, page) coordinate
//! against the cache, fetching from the API only on a miss.
//!
//! State changes are pushed to registered listeners as [`ListingEvent`]s,
//! so a front end can re-render from snapshots without polling.

pub mod window;

pub use window::{page_window, PageLink};

use std::sync::Arc;

use crate::api::{ApiError, PublicationApi};
use crate::cache::{CacheKey, ResultCache};
use crate::models::{Publication, PAGE_SIZE};

/// What the listing is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingMode {
    /// Paging through the whole corpus.
    #[default]
    Browse,
    /// Paging through results for the active query.
    Search,
}

/// Immutable view of the listing state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSnapshot {
    pub items: Vec<Publication>,
    pub page: u32,
    pub total_pages: u32,
    pub loading: bool,
    pub mode: ListingMode,
    pub query: String,
}

/// Events pushed to listing observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEvent {
    /// State changed; carries the full new snapshot.
    Updated(ListingSnapshot),
    /// The view should scroll back to the top of the list.
    ScrollToTop,
}

type Listener = Box<dyn Fn(&ListingEvent) + Send + Sync>;

/// Controller for a paged, searchable, cached publication listing.
///
/// The controller is deliberately sequential: operations take `&mut self`
/// and drive their fetch to completion, so two operations can never
/// interleave. A resolution sequence number guards against the one racy
/// case left, a caller dropping an in-flight operation and starting
/// another.
pub struct ListingController {
    api: Arc<dyn PublicationApi>,
    cache: Arc<dyn ResultCache>,
    query: String,
    mode: ListingMode,
    page: u32,
    total_pages: u32,
    items: Vec<Publication>,
    loading: bool,
    fetch_seq: u64,
    listeners: Vec<Listener>,
}

impl ListingController {
    pub fn new(api: Arc<dyn PublicationApi>, cache: Arc<dyn ResultCache>) -> Self {
        Self {
            api,
            cache,
            query: String::new(),
            mode: ListingMode::Browse,
            page: 1,
            total_pages: 1,
            items: Vec::new(),
            loading: false,
            fetch_seq: 0,
            listeners: Vec::new(),
        }
    }

    /// Register an observer for state updates and scroll requests.
    pub fn on_event(&mut self, listener: impl Fn(&ListingEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn items(&self) -> &[Publication] {
        &self.items
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn mode(&self) -> ListingMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            items: self.items.clone(),
            page: self.page,
            total_pages: self.total_pages,
            loading: self.loading,
            mode: self.mode,
            query: self.query.clone(),
        }
    }

    /// Page links for the current position, for rendering a pagination
    /// strip.
    pub fn page_links(&self) -> Vec<PageLink> {
        page_window(self.total_pages, self.page)
    }

    /// Load the first page. Call once after construction.
    pub async fn initialize(&mut self) -> Result<(), ApiError> {
        self.resolve_current_page().await
    }

    /// Update the query text without fetching anything. The new text only
    /// takes effect on the next [`search`](Self::search).
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.publish_update();
    }

    /// Run a search for the current query, starting from page 1.
    ///
    /// Does nothing when the query is blank or a fetch is already in
    /// flight. Switching to search results invalidates the whole page
    /// cache.
    pub async fn search(&mut self) -> Result<(), ApiError> {
        if self.query.trim().is_empty() || self.loading {
            return Ok(());
        }

        self.cache.clear_all();
        self.mode = ListingMode::Search;
        self.page = 1;
        self.resolve_current_page().await
    }

    /// Drop any active search and return to browsing from page 1.
    ///
    /// Does nothing when already browsing with an empty query. Leaving
    /// search results invalidates the whole page cache.
    pub async fn clear(&mut self) -> Result<(), ApiError> {
        if self.mode == ListingMode::Browse && self.query.is_empty() {
            return Ok(());
        }

        self.cache.clear_all();
        self.mode = ListingMode::Browse;
        self.query.clear();
        self.page = 1;
        self.resolve_current_page().await
    }

    /// Navigate to `page`. Out-of-range targets are ignored; valid ones
    /// ask observers to scroll back to the top, even when the page does
    /// not change.
    pub async fn go_to_page(&mut self, page: u32) -> Result<(), ApiError> {
        if page < 1 || page > self.total_pages {
            return Ok(());
        }

        self.page = page;
        self.emit(&ListingEvent::ScrollToTop);
        self.resolve_current_page().await
    }

    /// The query the current mode fetches and caches under. Browse mode
    /// ignores whatever is typed in the search box.
    fn effective_query(&self) -> &str {
        match self.mode {
            ListingMode::Search => &self.query,
            ListingMode::Browse => "",
        }
    }

    /// Bring `items` in line with the current (mode, query, page)
    /// coordinate: serve from cache when possible, otherwise fetch and
    /// cache the result. Every mutating operation funnels through here.
    async fn resolve_current_page(&mut self) -> Result<(), ApiError> {
        let key = CacheKey::new(self.effective_query(), self.page);

        if let Some(cached) = self.cache.get(&key) {
            self.loading = false;
            self.total_pages = cached.total_pages(PAGE_SIZE);
            self.items = cached.papers;
            self.publish_update();
            return Ok(());
        }

        self.fetch_seq += 1;
        let seq = self.fetch_seq;
        self.loading = true;
        self.publish_update();

        let result = match self.mode {
            ListingMode::Browse => self.api.fetch_page(self.page, PAGE_SIZE).await,
            ListingMode::Search => self.api.fetch_search(&self.query, self.page, PAGE_SIZE).await,
        };

        if seq != self.fetch_seq {
            // A newer resolution started while this one was in flight; its
            // outcome wins and ours is discarded wholesale.
            return Ok(());
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.total_pages = page.total_pages(PAGE_SIZE);
                self.items = page.papers.clone();
                self.cache.put(&key, &page);
                self.publish_update();
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Failed to resolve page {}: {}", self.page, err);
                self.publish_update();
                Err(err)
            }
        }
    }

    fn publish_update(&self) {
        let event = ListingEvent::Updated(self.snapshot());
        self.emit(&event);
    }

    fn emit(&self, event: &ListingEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl std::fmt::Debug for ListingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingController")
            .field("mode", &self.mode)
            .field("query", &self.query)
            .field("page", &self.page)
            .field("total_pages", &self.total_pages)
            .field("items", &self.items.len())
            .field("loading", &self.loading)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{make_publications, MockApi};
    use crate::cache::MemoryCache;

    fn controller_with(api: Arc<MockApi>) -> ListingController {
        ListingController::new(api, Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn test_initialize_loads_first_browse_page() {
        let api = Arc::new(MockApi::with_corpus(make_publications(20)));
        let mut controller = controller_with(api.clone());

        controller.initialize().await.unwrap();

        assert_eq!(controller.mode(), ListingMode::Browse);
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.total_pages(), 3);
        assert_eq!(controller.items().len(), 9);
        assert!(!controller.loading());
        assert_eq!(api.page_calls(), vec![(1, 9)]);
    }

    #[tokio::test]
    async fn test_search_switches_mode_and_resets_page() {
        let api = Arc::new(MockApi::with_corpus(make_publications(20)));
        let mut controller = controller_with(api.clone());
        controller.initialize().await.unwrap();
        controller.go_to_page(2).await.unwrap();

        controller.set_query("Publication 1");
        controller.search().await.unwrap();

        assert_eq!(controller.mode(), ListingMode::Search);
        assert_eq!(controller.page(), 1);
        assert_eq!(api.search_calls(), vec![("Publication 1".to_string(), 1)]);
        // Titles 1 and 10 through 19 match, eleven in all.
        assert_eq!(controller.items().len(), 9);
        assert_eq!(controller.total_pages(), 2);
    }

    #[tokio::test]
    async fn test_search_with_blank_query_is_noop() {
        let api = Arc::new(MockApi::with_corpus(make_publications(5)));
        let mut controller = controller_with(api.clone());
        controller.initialize().await.unwrap();

        controller.set_query("   ");
        controller.search().await.unwrap();

        assert_eq!(controller.mode(), ListingMode::Browse);
        assert!(api.search_calls().is_empty());
    }

    #[tokio::test]
    async fn test_set_query_does_not_fetch() {
        let api = Arc::new(MockApi::with_corpus(make_publications(5)));
        let mut controller = controller_with(api.clone());
        controller.initialize().await.unwrap();
        let before = controller.items().to_vec();

        controller.set_query("enzyme");

        assert_eq!(api.fetch_count(), 1);
        assert_eq!(controller.items(), before.as_slice());
        assert_eq!(controller.query(), "enzyme");
    }

    #[tokio::test]
    async fn test_go_to_page_out_of_range_is_noop() {
        let api = Arc::new(MockApi::with_corpus(make_publications(20)));
        let mut controller = controller_with(api.clone());
        controller.initialize().await.unwrap();

        controller.go_to_page(0).await.unwrap();
        controller.go_to_page(4).await.unwrap();

        assert_eq!(controller.page(), 1);
        assert_eq!(api.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_when_pristine_is_noop() {
        let api = Arc::new(MockApi::with_corpus(make_publications(5)));
        let mut controller = controller_with(api.clone());
        controller.initialize().await.unwrap();

        controller.clear().await.unwrap();

        assert_eq!(api.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_resets_typed_query_without_search() {
        let api = Arc::new(MockApi::with_corpus(make_publications(5)));
        let mut controller = controller_with(api.clone());
        controller.initialize().await.unwrap();
        controller.set_query("typed but never searched");

        controller.clear().await.unwrap();

        assert_eq!(controller.query(), "");
        assert_eq!(controller.mode(), ListingMode::Browse);
        // Browse page 1 was evicted with the rest of the cache, so clear
        // refetches it.
        assert_eq!(api.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_page_links_follow_state() {
        let api = Arc::new(MockApi::with_corpus(make_publications(100)));
        let mut controller = controller_with(api);
        controller.initialize().await.unwrap();

        assert_eq!(controller.total_pages(), 12);
        assert_eq!(
            controller.page_links(),
            vec![
                PageLink::Page(1),
                PageLink::Page(2),
                PageLink::EndEllipsis,
                PageLink::Page(12)
            ]
        );
    }
}
