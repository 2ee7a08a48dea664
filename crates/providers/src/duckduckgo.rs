//! DuckDuckGo image search.
//!
//! The image endpoint needs a `vqd` token scraped from the regular search
//! page first; results then come back from `i.js` as JSON, one page at a time,
//! with a relative `next` link until the result set is exhausted.

use crate::http::{build_client, HttpConfig};
use crate::{ImageSearch, ProviderError, SearchResult};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Hard stop on pagination; DuckDuckGo occasionally loops on `next`.
const MAX_PAGES: usize = 10;

#[derive(Clone, Debug)]
pub struct DuckDuckGoConfig {
    pub base_url: String,
    pub region: String,
    pub safe_search: bool,
    pub http: HttpConfig,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://duckduckgo.com".to_string(),
            region: "us-en".to_string(),
            safe_search: true,
            http: HttpConfig::default(),
        }
    }
}

#[derive(Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    cfg: Arc<DuckDuckGoConfig>,
}

impl DuckDuckGoSearch {
    pub fn new(cfg: DuckDuckGoConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(&cfg.http)?,
            cfg: Arc::new(cfg),
        })
    }

    async fn fetch_vqd(&self, term: &str) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get(self.cfg.base_url.trim_end_matches('/'))
            .query(&[("q", term), ("iax", "images"), ("ia", "images")])
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "token request returned status {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        extract_vqd(&body)
            .ok_or_else(|| ProviderError::Malformed("no vqd token in search page".into()))
    }

    async fn fetch_page(&self, url: &str, query: &[(&str, &str)]) -> Result<ImagePage, ProviderError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .header("Referer", format!("{}/", self.cfg.base_url.trim_end_matches('/')))
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ProviderError::RequestFailed(format!(
                "image page returned status {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        parse_page(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ImagePage {
    #[serde(default)]
    results: Vec<ImageHit>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageHit {
    image: Option<String>,
    title: Option<String>,
    thumbnail: Option<String>,
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl ImageHit {
    fn into_result(self) -> Option<SearchResult> {
        let image_url = self.image.filter(|s| !s.is_empty())?;
        Some(SearchResult {
            image_url,
            title: self.title,
            thumbnail_url: self.thumbnail,
            source_url: self.url,
            width: self.width,
            height: self.height,
        })
    }
}

fn parse_page(body: &str) -> Result<ImagePage, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Pulls the `vqd` token out of the search page. It shows up either quoted
/// (`vqd="4-123"`) or as a query parameter (`vqd=4-123&`).
fn extract_vqd(html: &str) -> Option<String> {
    for (start, end) in [("vqd=\"", '"'), ("vqd='", '\''), ("vqd=", '&')] {
        if let Some(pos) = html.find(start) {
            let rest = &html[pos + start.len()..];
            if let Some(stop) = rest.find(end) {
                let token = &rest[..stop];
                if !token.is_empty() && !token.contains(char::is_whitespace) {
                    return Some(token.to_string());
                }
            }
        }
    }
    None
}

#[async_trait::async_trait]
impl ImageSearch for DuckDuckGoSearch {
    async fn search(
        &self,
        term: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let vqd = self.fetch_vqd(term).await?;
        let base = self.cfg.base_url.trim_end_matches('/');
        let safe = if self.cfg.safe_search { "1" } else { "-1" };

        let mut results = Vec::new();
        let mut page = self
            .fetch_page(
                &format!("{}/i.js", base),
                &[
                    ("l", self.cfg.region.as_str()),
                    ("o", "json"),
                    ("q", term),
                    ("vqd", vqd.as_str()),
                    ("f", ",,,,,"),
                    ("p", safe),
                ],
            )
            .await?;

        for page_no in 1..=MAX_PAGES {
            debug!(term, page_no, hits = page.results.len(), "image page");
            results.extend(page.results.drain(..).filter_map(ImageHit::into_result));
            if results.len() >= max_results {
                break;
            }
            match page.next.take() {
                Some(next) if page_no < MAX_PAGES => {
                    let url = format!("{}/{}", base, next.trim_start_matches('/'));
                    page = self.fetch_page(&url, &[("vqd", vqd.as_str())]).await?;
                }
                _ => break,
            }
        }

        results.truncate(max_results);
        Ok(results)
    }
}
