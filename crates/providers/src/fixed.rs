use crate::{ImageSearch, ProviderError, SearchResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Search provider that answers from a fixed list of URLs. Used for offline
/// runs (`search.provider = "fixed"`) and as a test double.
#[derive(Debug, Default)]
pub struct FixedSearch {
    default: Vec<SearchResult>,
    by_term: HashMap<String, Vec<SearchResult>>,
    queries: Mutex<Vec<String>>,
}

impl FixedSearch {
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default: urls.into_iter().map(SearchResult::from_url).collect(),
            ..Self::default()
        }
    }

    /// Answer `term` with `urls` instead of the default list.
    pub fn with_term<I, S>(mut self, term: &str, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.by_term.insert(
            term.to_string(),
            urls.into_iter().map(SearchResult::from_url).collect(),
        );
        self
    }

    /// Terms searched so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ImageSearch for FixedSearch {
    async fn search(
        &self,
        term: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        if let Ok(mut q) = self.queries.lock() {
            q.push(term.to_string());
        }
        let results = self.by_term.get(term).unwrap_or(&self.default);
        Ok(results.iter().take(max_results).cloned().collect())
    }
}
