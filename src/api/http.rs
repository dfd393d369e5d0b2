//! HTTP client for the GARD backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::api::{ApiError, PublicationApi};
use crate::config::ApiConfig;
use crate::models::{Publication, PublicationPage};

const PMC_ARTICLE_BASE: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles";

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Client for the paper listing, search and detail endpoints.
///
/// The detail endpoint sits behind HTTP basic auth on some deployments;
/// credentials are attached only when both username and password are
/// configured.
#[derive(Debug, Clone)]
pub struct GardApi {
    client: Arc<Client>,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl GardApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT_SECONDS),
            base_url: normalize_base_url(base_url.into()),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT_SECONDS),
            base_url: normalize_base_url(base_url.into()),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            client: build_client(config.timeout_seconds),
            base_url: normalize_base_url(config.base_url.clone()),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the full record for a single publication by PMC id.
    pub async fn get_paper(&self, pmcid: &str) -> Result<Publication, ApiError> {
        let url = format!("{}/get_paper/{}", self.base_url, urlencoding::encode(pmcid));
        tracing::debug!("Fetching paper {} from {}", pmcid, url);

        let mut request = self.client.get(&url);
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to fetch paper {}: {}", pmcid, e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(format!(
                "Paper endpoint returned status {} for {}",
                response.status(),
                pmcid
            )));
        }

        let body = response.text().await?;
        let raw: RawPaper = serde_json::from_str(&body)?;
        decode_paper(raw)
    }
}

#[async_trait]
impl PublicationApi for GardApi {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<PublicationPage, ApiError> {
        let url = format!(
            "{}/get_papers?page={}&limit={}",
            self.base_url, page, page_size
        );
        tracing::debug!("Fetching publication page {} from {}", page, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to fetch papers: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(format!(
                "Papers endpoint returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let envelope: PapersEnvelope = serde_json::from_str(&body)?;

        let papers = envelope
            .papers
            .into_iter()
            .map(decode_paper)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PublicationPage::new(papers, envelope.total))
    }

    async fn fetch_search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PublicationPage, ApiError> {
        let url = format!("{}/search_papers", self.base_url);
        tracing::debug!("Searching publications for {:?} (page {})", query, page);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "query": query,
                "page": page,
                "limit": page_size,
            }))
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to search papers: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(format!(
                "Search endpoint returned status: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let envelope: SearchEnvelope = serde_json::from_str(&body)?;

        // Search hits only carry ids; hydrate each through the detail
        // endpoint. A failed lookup fails the whole page.
        let mut papers = Vec::with_capacity(envelope.papers.len());
        for hit in &envelope.papers {
            let pmcid = hit
                .pmcid
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ApiError::Decode("search hit is missing PMCID".to_string()))?;
            papers.push(self.get_paper(pmcid).await?);
        }

        Ok(PublicationPage::new(papers, envelope.total))
    }
}

fn build_client(timeout_seconds: u64) -> Arc<Client> {
    let client = Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client");
    Arc::new(client)
}

fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}

fn decode_paper(raw: RawPaper) -> Result<Publication, ApiError> {
    let id = raw
        .pmcid
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Decode("paper record is missing PMCID".to_string()))?;

    let title = raw
        .title
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Decode(format!("paper {} is missing a title", id)))?;

    let link = match raw.doi.as_deref() {
        Some(doi) if doi.starts_with("http") => doi.to_string(),
        _ => format!("{}/{}/", PMC_ARTICLE_BASE, id),
    };

    Ok(Publication {
        id,
        title,
        authors: raw.authors.unwrap_or_default(),
        r#abstract: raw.r#abstract.unwrap_or_default(),
        link,
        year: derive_year(raw.publication_date.as_deref()),
    })
}

/// Extract a four-digit year from whatever date string the backend stored.
/// Records carry anything from full RFC 3339 timestamps to bare "2021".
fn derive_year(date: Option<&str>) -> String {
    let raw = match date.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return String::from("Unknown"),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.year().to_string();
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.year().to_string();
    }

    // Last resort: first run of four ascii digits.
    let bytes = raw.as_bytes();
    let mut run = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 4 {
                return raw[i + 1 - 4..=i].to_string();
            }
        } else {
            run = 0;
        }
    }

    String::from("Unknown")
}

// ===== GARD API Types =====

#[derive(Debug, Deserialize)]
struct PapersEnvelope {
    #[serde(default)]
    papers: Vec<RawPaper>,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    papers: Vec<SearchHit>,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "PMCID")]
    pmcid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPaper {
    #[serde(rename = "PMCID")]
    pmcid: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Authors")]
    authors: Option<Vec<String>>,
    #[serde(rename = "Abstract")]
    r#abstract: Option<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "PublicationDate")]
    publication_date: Option<String>,
}
