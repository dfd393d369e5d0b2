//! In-process page cache.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::cache::{CacheKey, ResultCache};
use crate::models::PublicationPage;

/// HashMap-backed [`ResultCache`]. No persistence and no eviction; the
/// controller clears it wholesale on search and filter changes.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, PublicationPage>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<PublicationPage> {
        let entries = self.entries.lock().unwrap();
        match entries.get(&key.storage_key()) {
            Some(page) => {
                tracing::debug!("Cache HIT for {}", key);
                Some(page.clone())
            }
            None => {
                tracing::debug!("Cache MISS for {}", key);
                None
            }
        }
    }

    fn put(&self, key: &CacheKey, page: &PublicationPage) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.storage_key(), page.clone());
    }

    fn clear_all(&self) {
        self.entries.lock().unwrap().clear();
    }
}
