//! In-memory [`PublicationApi`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{ApiError, PublicationApi};
use crate::models::{Publication, PublicationPage};

/// Test double backed by a fixed corpus. Pages are sliced out of the
/// corpus; searches filter it by case-insensitive title match. Every call
/// is recorded so tests can assert on fetch behavior.
#[derive(Debug, Default)]
pub struct MockApi {
    corpus: Mutex<Vec<Publication>>,
    page_calls: Mutex<Vec<(u32, u32)>>,
    search_calls: Mutex<Vec<(String, u32)>>,
    fail_message: Mutex<Option<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_corpus(corpus: Vec<Publication>) -> Self {
        let api = Self::new();
        api.set_corpus(corpus);
        api
    }

    pub fn set_corpus(&self, corpus: Vec<Publication>) {
        *self.corpus.lock().unwrap() = corpus;
    }

    /// Make the next fetch fail with a transport error carrying `message`.
    pub fn fail_next_with(&self, message: impl Into<String>) {
        *self.fail_message.lock().unwrap() = Some(message.into());
    }

    /// Total number of fetches served (pages plus searches).
    pub fn fetch_count(&self) -> usize {
        self.page_calls.lock().unwrap().len() + self.search_calls.lock().unwrap().len()
    }

    pub fn page_calls(&self) -> Vec<(u32, u32)> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<(String, u32)> {
        self.search_calls.lock().unwrap().clone()
    }

    fn take_failure(&self) -> Option<ApiError> {
        self.fail_message
            .lock()
            .unwrap()
            .take()
            .map(ApiError::Transport)
    }

    fn slice(matching: Vec<Publication>, page: u32, page_size: u32) -> PublicationPage {
        let total = matching.len() as u64;
        let start = (page.saturating_sub(1) as usize) * page_size as usize;
        let papers = matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        PublicationPage::new(papers, total)
    }
}

#[async_trait]
impl PublicationApi for MockApi {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PublicationPage, ApiError> {
        self.page_calls.lock().unwrap().push((page, page_size));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let corpus = self.corpus.lock().unwrap().clone();
        Ok(Self::slice(corpus, page, page_size))
    }

    async fn fetch_search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PublicationPage, ApiError> {
        self.search_calls
            .lock()
            .unwrap()
            .push((query.to_string(), page));
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let needle = query.to_lowercase();
        let matching: Vec<Publication> = self
            .corpus
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(Self::slice(matching, page, page_size))
    }
}

/// Build a publication with the fields tests care about filled in.
pub fn make_publication(id: &str, title: &str) -> Publication {
    Publication {
        id: id.to_string(),
        title: title.to_string(),
        authors: vec!["Test Author".to_string()],
        r#abstract: format!("Abstract for {}", title),
        link: format!("https://www.ncbi.nlm.nih.gov/pmc/articles/{}/", id),
        year: "2023".to_string(),
    }
}

/// Build `count` publications with ids PMC0001, PMC0002, ...
pub fn make_publications(count: usize) -> Vec<Publication> {
    (1..=count)
        .map(|i| make_publication(&format!("PMC{:04}", i), &format!("Publication {}", i)))
        .collect()
}
