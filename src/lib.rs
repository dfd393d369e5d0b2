//! GARD client core.
//!
//! Client-side logic for browsing and searching the GARD research
//! publication corpus: typed models, backend API clients, a persistent
//! page cache, and the [`ListingController`] state machine that ties them
//! together for a paged, searchable listing. The `gard` binary wraps all
//! of it in a CLI.

pub mod api;
pub mod cache;
pub mod config;
pub mod listing;
pub mod models;
pub mod ui;

pub use api::{ApiError, ChatClient, GardApi, PublicationApi};
pub use cache::{DiskCache, MemoryCache, ResultCache};
pub use listing::{ListingController, ListingEvent, ListingMode, ListingSnapshot};
pub use models::{Publication, PublicationPage, PAGE_SIZE};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
