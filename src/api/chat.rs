//! Client for the corpus chatbot endpoints.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::ApiError;
use crate::config::ApiConfig;

/// Answer synthesized from the whole corpus, with the retrieved passages
/// that grounded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub summary: String,
    #[serde(default)]
    pub retrieved_chunks: Vec<String>,
}

/// Answer about one specific paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperAnswer {
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "Query")]
    pub query: String,
    #[serde(rename = "Answer")]
    pub answer: String,
}

/// Client for the `/chatbot` endpoints.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Arc<Client>,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            // Retrieval plus generation regularly takes the better part of
            // a minute on the backend.
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    /// Ask a question against the whole corpus, retrieving `top_k` chunks.
    pub async fn ask(&self, question: &str, top_k: u32) -> Result<ChatAnswer, ApiError> {
        let url = format!("{}/chatbot", self.base_url);
        tracing::debug!("Asking chatbot (top_k={}): {:?}", top_k, question);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": question, "top_k": top_k }))
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to reach chatbot: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(format!(
                "Chatbot endpoint returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Ask a question about a single paper, identified by its link.
    pub async fn ask_about(&self, link: &str, question: &str) -> Result<PaperAnswer, ApiError> {
        let url = format!("{}/chatbot/ask", self.base_url);
        tracing::debug!("Asking about {}: {:?}", link, question);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": question, "link": link }))
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to reach chatbot: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(format!(
                "Chatbot ask endpoint returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
