//! Provider abstractions for image search and image download.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod duckduckgo;
pub mod fixed;
pub mod http;

#[cfg(test)]
mod test_server;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}

/// One record returned by an image search. Only `image_url` is consumed by
/// the pipeline; the rest is whatever metadata the provider hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl SearchResult {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            image_url: url.into(),
            title: None,
            thumbnail_url: None,
            source_url: None,
            width: None,
            height: None,
        }
    }
}

#[async_trait::async_trait]
pub trait ImageSearch: Send + Sync {
    /// Returns at most `max_results` records for `term`, in provider order.
    async fn search(&self, term: &str, max_results: usize)
        -> Result<Vec<SearchResult>, ProviderError>;
}

#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, ProviderError>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    searches: HashMap<String, Arc<dyn ImageSearch>>,
    pub preferred_search: Option<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, name: &str, provider: Arc<dyn ImageSearch>) -> Self {
        self.searches.insert(name.to_string(), provider);
        self
    }

    pub fn set_preferred_search(mut self, name: &str) -> Self {
        self.preferred_search = Some(name.to_string());
        self
    }

    pub fn search(&self, name: Option<&str>) -> Result<Arc<dyn ImageSearch>, ProviderError> {
        let key = name
            .map(str::to_string)
            .or_else(|| self.preferred_search.clone())
            .ok_or_else(|| ProviderError::UnknownProvider("no search provider configured".into()))?;
        self.searches
            .get(&key)
            .cloned()
            .ok_or(ProviderError::UnknownProvider(key))
    }
}
