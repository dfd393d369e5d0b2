//! End-to-end tests driving [`ListingController`] against the mock API
//! with real cache implementations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gard_client::api::mock::{make_publications, MockApi};
use gard_client::api::{ApiError, PublicationApi};
use gard_client::cache::{DiskCache, MemoryCache};
use gard_client::listing::{ListingController, ListingEvent, ListingMode};
use gard_client::models::{PublicationPage, PAGE_SIZE};

fn controller_over(api: &Arc<MockApi>) -> ListingController {
    ListingController::new(api.clone(), Arc::new(MemoryCache::new()))
}

fn ids(controller: &ListingController) -> Vec<String> {
    controller.items().iter().map(|p| p.id.clone()).collect()
}

#[tokio::test]
async fn browse_pagination_end_to_end() {
    let api = Arc::new(MockApi::with_corpus(make_publications(20)));
    let mut controller = controller_over(&api);

    controller.initialize().await.unwrap();
    assert_eq!(controller.page(), 1);
    assert_eq!(controller.total_pages(), 3);
    assert_eq!(controller.items().len(), 9);
    assert_eq!(ids(&controller)[0], "PMC0001");

    controller.go_to_page(2).await.unwrap();
    let expected: Vec<String> = (10..=18).map(|i| format!("PMC{:04}", i)).collect();
    assert_eq!(ids(&controller), expected);

    controller.go_to_page(3).await.unwrap();
    assert_eq!(controller.items().len(), 2);

    assert_eq!(
        api.page_calls(),
        vec![(1, PAGE_SIZE), (2, PAGE_SIZE), (3, PAGE_SIZE)]
    );
}

#[tokio::test]
async fn revisited_pages_come_from_cache() {
    let api = Arc::new(MockApi::with_corpus(make_publications(20)));
    let mut controller = controller_over(&api);

    controller.initialize().await.unwrap();
    controller.go_to_page(2).await.unwrap();
    controller.go_to_page(1).await.unwrap();
    controller.go_to_page(2).await.unwrap();

    // Pages 1 and 2 were each fetched exactly once.
    assert_eq!(api.page_calls(), vec![(1, PAGE_SIZE), (2, PAGE_SIZE)]);
    assert_eq!(ids(&controller)[0], "PMC0010");
}

#[tokio::test]
async fn events_follow_navigation() {
    let api = Arc::new(MockApi::with_corpus(make_publications(20)));
    let mut controller = controller_over(&api);

    let events: Arc<Mutex<Vec<ListingEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    controller.on_event(move |event| sink.lock().unwrap().push(event.clone()));

    controller.initialize().await.unwrap();
    {
        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], ListingEvent::Updated(s) if s.loading));
        assert!(matches!(&seen[1], ListingEvent::Updated(s) if !s.loading && s.items.len() == 9));
    }

    events.lock().unwrap().clear();
    controller.go_to_page(2).await.unwrap();
    {
        let seen = events.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], ListingEvent::ScrollToTop);
        assert!(matches!(&seen[1], ListingEvent::Updated(s) if s.loading && s.page == 2));
        assert!(matches!(&seen[2], ListingEvent::Updated(s) if !s.loading && s.page == 2));
    }

    // Out-of-range navigation is ignored entirely, not even an event.
    events.lock().unwrap().clear();
    controller.go_to_page(99).await.unwrap();
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn search_switches_mode_and_clear_refetches() {
    let api = Arc::new(MockApi::with_corpus(make_publications(12)));
    let mut controller = controller_over(&api);

    controller.initialize().await.unwrap();
    assert_eq!(api.fetch_count(), 1);

    controller.set_query("publication 1");
    controller.search().await.unwrap();
    assert_eq!(controller.mode(), ListingMode::Search);
    assert_eq!(controller.page(), 1);
    // Publication 1, 10, 11 and 12 match.
    assert_eq!(controller.items().len(), 4);
    assert_eq!(api.search_calls(), vec![("publication 1".to_string(), 1)]);

    controller.clear().await.unwrap();
    assert_eq!(controller.mode(), ListingMode::Browse);
    assert_eq!(controller.query(), "");
    assert_eq!(controller.items().len(), 9);
    // The search invalidated the cached browse page, so clearing fetched
    // it again.
    assert_eq!(api.page_calls(), vec![(1, PAGE_SIZE), (1, PAGE_SIZE)]);
}

#[tokio::test]
async fn search_results_paginate() {
    let api = Arc::new(MockApi::with_corpus(make_publications(30)));
    let mut controller = controller_over(&api);

    controller.initialize().await.unwrap();
    controller.set_query("Publication");
    controller.search().await.unwrap();
    assert_eq!(controller.total_pages(), 4);
    assert_eq!(controller.items().len(), 9);

    controller.go_to_page(4).await.unwrap();
    assert_eq!(controller.items().len(), 3);
    assert_eq!(
        api.search_calls(),
        vec![
            ("Publication".to_string(), 1),
            ("Publication".to_string(), 4)
        ]
    );
}

#[tokio::test]
async fn failed_fetch_keeps_last_good_page() {
    let api = Arc::new(MockApi::with_corpus(make_publications(20)));
    let mut controller = controller_over(&api);

    controller.initialize().await.unwrap();
    let before = ids(&controller);

    api.fail_next_with("backend offline");
    let err = controller.go_to_page(2).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(err.to_string().contains("backend offline"));

    assert_eq!(ids(&controller), before);
    assert!(!controller.loading());
    assert_eq!(controller.page(), 2);

    // The failed page was never cached; the next visit fetches again.
    controller.go_to_page(2).await.unwrap();
    assert_eq!(ids(&controller)[0], "PMC0010");
    assert_eq!(
        api.page_calls(),
        vec![(1, PAGE_SIZE), (2, PAGE_SIZE), (2, PAGE_SIZE)]
    );
}

#[tokio::test]
async fn disk_cache_persists_across_controllers() {
    let dir = tempfile::tempdir().unwrap();

    let first_api = Arc::new(MockApi::with_corpus(make_publications(20)));
    let first_cache = DiskCache::new(dir.path());
    first_cache.initialize().unwrap();
    let mut first = ListingController::new(first_api.clone(), Arc::new(first_cache));
    first.initialize().await.unwrap();
    first.go_to_page(2).await.unwrap();
    assert_eq!(first_api.fetch_count(), 2);

    // A fresh controller over the same directory serves both pages
    // without touching the API.
    let second_api = Arc::new(MockApi::with_corpus(Vec::new()));
    let second_cache = DiskCache::new(dir.path());
    second_cache.initialize().unwrap();
    let mut second = ListingController::new(second_api.clone(), Arc::new(second_cache));
    second.initialize().await.unwrap();
    second.go_to_page(2).await.unwrap();

    assert_eq!(second_api.fetch_count(), 0);
    assert_eq!(second.items().len(), 9);
    assert_eq!(second.items()[0].id, "PMC0010");
}

/// [`PublicationApi`] wrapper that hangs the first fetch forever, for
/// testing callers that drop an in-flight operation.
#[derive(Debug)]
struct StallOnceApi {
    inner: MockApi,
    stall_next: AtomicBool,
}

impl StallOnceApi {
    fn new(corpus_size: usize) -> Self {
        Self {
            inner: MockApi::with_corpus(make_publications(corpus_size)),
            stall_next: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl PublicationApi for StallOnceApi {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PublicationPage, ApiError> {
        if self.stall_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.fetch_page(page, page_size).await
    }

    async fn fetch_search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PublicationPage, ApiError> {
        if self.stall_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.fetch_search(query, page, page_size).await
    }
}

#[tokio::test]
async fn dropped_fetch_recovers_on_next_operation() {
    let api = Arc::new(StallOnceApi::new(20));
    let mut controller = ListingController::new(api.clone(), Arc::new(MemoryCache::new()));

    // Caller gives up on a hung fetch.
    let hung = tokio::time::timeout(Duration::from_millis(20), controller.initialize()).await;
    assert!(hung.is_err());
    assert!(controller.loading());
    assert!(controller.items().is_empty());

    // While the listing still thinks a fetch is in flight, search is a
    // no-op.
    controller.set_query("publication");
    controller.search().await.unwrap();
    assert_eq!(controller.mode(), ListingMode::Browse);
    assert!(api.inner.search_calls().is_empty());

    // Navigating resolves afresh and clears the stuck flag.
    controller.go_to_page(1).await.unwrap();
    assert!(!controller.loading());
    assert_eq!(controller.items().len(), 9);
    assert_eq!(api.inner.page_calls(), vec![(1, PAGE_SIZE)]);
}
