//! File-based page cache.
//!
//! Cache layout:
//!
//! ```text
//! ~/.cache/gard/
//!   pages/
//!     <md5 of storage key>.json
//! ```
//!
//! Each entry is a JSON file holding the page plus the storage key it was
//! written under, so entries survive across runs of the CLI.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, ResultCache};
use crate::config::CacheConfig;
use crate::models::PublicationPage;

/// Wrapper for a cached page
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedPage {
    /// Storage key the entry was written under
    storage_key: String,

    /// When the page was cached (Unix timestamp)
    cached_at: u64,

    /// The actual page
    page: PublicationPage,
}

/// Persistent [`ResultCache`] storing one JSON file per listing page.
#[derive(Debug, Clone)]
pub struct DiskCache {
    /// Base cache directory
    base_dir: PathBuf,

    /// Page cache directory
    pages_dir: PathBuf,

    /// Whether caching is enabled
    enabled: bool,
}

impl DiskCache {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let pages_dir = base_dir.join("pages");
        Self {
            base_dir,
            pages_dir,
            enabled: true,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let base_dir = config
            .directory
            .clone()
            .unwrap_or_else(crate::config::default_cache_dir);
        let pages_dir = base_dir.join("pages");
        Self {
            base_dir,
            pages_dir,
            enabled: config.enabled,
        }
    }

    /// Initialize the cache directory
    pub fn initialize(&self) -> std::io::Result<()> {
        if self.enabled {
            fs::create_dir_all(&self.pages_dir)?;
            tracing::info!("Cache initialized at: {}", self.base_dir.display());
        } else {
            tracing::debug!("Cache is disabled");
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let digest = md5::compute(key.storage_key().as_bytes());
        self.pages_dir.join(format!("{:x}.json", digest))
    }

    fn read_cache_file<T: for<'de> Deserialize<'de>>(
        &self,
        path: &Path,
    ) -> Result<T, std::io::Error> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    fn write_cache_file<T: Serialize>(&self, path: &Path, data: &T) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(data)?;
        fs::write(path, content)
    }

    /// Get cache statistics
    pub fn stats(&self) -> DiskCacheStats {
        if !self.enabled {
            return DiskCacheStats::disabled();
        }

        let entry_count = self.pages_dir.read_dir().map(|e| e.count()).unwrap_or(0);
        let size_kb = dir_size(&self.pages_dir).map(|s| s / 1024).unwrap_or(0);

        DiskCacheStats {
            enabled: true,
            cache_dir: self.base_dir.clone(),
            entry_count,
            size_kb,
        }
    }
}

impl ResultCache for DiskCache {
    fn get(&self, key: &CacheKey) -> Option<PublicationPage> {
        if !self.enabled {
            return None;
        }

        let path = self.entry_path(key);
        match self.read_cache_file::<CachedPage>(&path) {
            Ok(cached) => {
                tracing::debug!("Cache HIT for {}", key);
                Some(cached.page)
            }
            Err(_) => {
                tracing::debug!("Cache MISS for {}", key);
                None
            }
        }
    }

    fn put(&self, key: &CacheKey, page: &PublicationPage) {
        if !self.enabled {
            return;
        }

        let cached = CachedPage {
            storage_key: key.storage_key(),
            cached_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            page: page.clone(),
        };

        let path = self.entry_path(key);
        if let Err(e) = self.write_cache_file(&path, &cached) {
            tracing::warn!("Failed to cache page: {}", e);
        } else {
            tracing::debug!("Cached {}", key);
        }
    }

    fn clear_all(&self) {
        if !self.enabled {
            return;
        }

        let _ = fs::remove_dir_all(&self.pages_dir);
        if let Err(e) = fs::create_dir_all(&self.pages_dir) {
            tracing::warn!("Failed to recreate page cache directory: {}", e);
        } else {
            tracing::info!("Page cache cleared");
        }
    }
}

/// Calculate the total size of a directory
fn dir_size(path: &Path) -> Result<u64, std::io::Error> {
    let mut size = 0;
    if let Ok(entries) = path.read_dir() {
        for entry in entries.flatten() {
            size += if entry.path().is_dir() {
                dir_size(&entry.path()).unwrap_or(0)
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            };
        }
    }
    Ok(size)
}

/// Statistics about the page cache
#[derive(Debug, Clone)]
pub struct DiskCacheStats {
    pub enabled: bool,
    pub cache_dir: PathBuf,
    pub entry_count: usize,
    pub size_kb: u64,
}

impl DiskCacheStats {
    fn disabled() -> Self {
        Self {
            enabled: false,
            cache_dir: PathBuf::new(),
            entry_count: 0,
            size_kb: 0,
        }
    }
}
