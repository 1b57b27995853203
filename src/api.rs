//! Client for the scraping endpoints.
//!
//! Fetching pages and pulling favicons, search results, chapter links and
//! page images out of them happens behind four JSON endpoints. This module
//! only speaks their wire format.

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::formats::{Chapter, SearchHit, SiteInfo};

#[async_trait]
pub trait ScrapeApi: Send + Sync {
    async fn favicon_title(&self, url: &str) -> anyhow::Result<SiteInfo>;
    async fn search_links(&self, url: &str, target_name: &str) -> anyhow::Result<Vec<SearchHit>>;
    async fn chapter_links(&self, url: &str, target_name: &str) -> anyhow::Result<Vec<Chapter>>;
    async fn images(&self, url: &str) -> anyhow::Result<Vec<String>>;
}

#[derive(Debug, Clone)]
pub struct HttpScrapeApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpScrapeApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        format!("{base_url}/api/{path}")
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> anyhow::Result<T> {
        let endpoint = self.endpoint(path);
        tracing::debug!(%endpoint, "scrape api request");

        let response = self
            .client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .with_context(|| format!("read response body: {endpoint}"))?;
        if !status.is_success() {
            anyhow::bail!("scrape api error ({status}) from {endpoint}: {raw}");
        }

        serde_json::from_str(&raw).with_context(|| format!("parse response: {endpoint}"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaviconTitleResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    favicon_url: String,
    #[serde(default)]
    site_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchLinksResponse {
    #[serde(default)]
    paired_data: Option<Vec<SearchHit>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterLinksResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    chapter_links: Option<Vec<Chapter>>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    images: Option<Vec<String>>,
}

#[async_trait]
impl ScrapeApi for HttpScrapeApi {
    async fn favicon_title(&self, url: &str) -> anyhow::Result<SiteInfo> {
        let response: FaviconTitleResponse = self
            .post("favicon-title", &serde_json::json!({ "url": url }))
            .await?;
        if !response.success {
            anyhow::bail!("failed to fetch site data for {url}");
        }
        Ok(SiteInfo {
            favicon_url: response.favicon_url,
            site_title: response.site_title,
        })
    }

    async fn search_links(&self, url: &str, target_name: &str) -> anyhow::Result<Vec<SearchHit>> {
        let response: SearchLinksResponse = self
            .post(
                "search-links",
                &serde_json::json!({ "url": url, "targetName": target_name }),
            )
            .await?;
        Ok(response.paired_data.unwrap_or_default())
    }

    async fn chapter_links(&self, url: &str, target_name: &str) -> anyhow::Result<Vec<Chapter>> {
        let response: ChapterLinksResponse = self
            .post(
                "chapter-links",
                &serde_json::json!({ "url": url, "targetName": target_name }),
            )
            .await?;
        match response.chapter_links {
            Some(chapters) if response.success => Ok(chapters),
            _ => Ok(Vec::new()),
        }
    }

    async fn images(&self, url: &str) -> anyhow::Result<Vec<String>> {
        let response: ImagesResponse = self
            .post("images", &serde_json::json!({ "url": url }))
            .await?;
        match response.images {
            Some(images) if response.success => Ok(images),
            _ => anyhow::bail!("images not found for {url}"),
        }
    }
}
