//! Backend API clients and the port the listing controller talks through.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::PublicationPage;

pub mod chat;
pub mod http;
pub mod mock;

pub use chat::{ChatAnswer, ChatClient, PaperAnswer};
pub use http::GardApi;
pub use mock::MockApi;

/// Errors from talking to the backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a usable response: connection failures,
    /// timeouts, non-success HTTP statuses.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response arrived but its body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(format!("JSON: {}", err))
    }
}

/// Source of listing pages. The controller only ever needs these two
/// fetches; everything else (detail lookups, chat) lives on the concrete
/// clients.
#[async_trait]
pub trait PublicationApi: Send + Sync + std::fmt::Debug {
    /// Fetch one page of the unfiltered corpus.
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PublicationPage, ApiError>;

    /// Fetch one page of results for a search query.
    async fn fetch_search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PublicationPage, ApiError>;
}
