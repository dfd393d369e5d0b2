//! Caching of listing pages.
//!
//! Every fetched page is stored under a key derived from the normalized
//! query and the page number, so revisiting a page never refetches it.
//! Entries have no TTL; the whole cache is dropped when the user changes
//! what they are looking at (new search, cleared filters).

mod disk;
mod memory;

pub use disk::{DiskCache, DiskCacheStats};
pub use memory::MemoryCache;

use crate::models::PublicationPage;

pub const CACHE_PREFIX: &str = "publications_cache";

/// Key identifying one cached listing page.
///
/// The query half is trimmed and lowercased so "Gene" and " gene " share
/// an entry; browse mode (no query) uses the literal "all".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    page: u32,
}

impl CacheKey {
    pub fn new(query: &str, page: u32) -> Self {
        let normalized = query.trim().to_lowercase();
        Self {
            query: if normalized.is_empty() {
                String::from("all")
            } else {
                normalized
            },
            page,
        }
    }

    pub fn normalized_query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Full storage key, e.g. `publications_cache_gene therapy_page_2`.
    pub fn storage_key(&self) -> String {
        format!("{}_{}_page_{}", CACHE_PREFIX, self.query, self.page)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

/// Store for fetched listing pages.
pub trait ResultCache: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &CacheKey) -> Option<PublicationPage>;
    fn put(&self, key: &CacheKey, page: &PublicationPage);
    fn clear_all(&self);
}
