use serde::{Deserialize, Serialize};

use crate::models::Publication;

/// Number of publications shown per listing page.
pub const PAGE_SIZE: u32 = 9;

/// One page of listing results together with the corpus-wide total,
/// as returned by the paper endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationPage {
    pub papers: Vec<Publication>,
    /// Total number of matching publications across all pages.
    pub total: u64,
}

impl PublicationPage {
    pub fn new(papers: Vec<Publication>, total: u64) -> Self {
        Self { papers, total }
    }

    /// Page count for the given page size. An empty corpus still has one
    /// (empty) page so that page navigation always has a valid target.
    pub fn total_pages(&self, page_size: u32) -> u32 {
        (((self.total + page_size as u64 - 1) / page_size as u64) as u32).max(1)
    }
}
