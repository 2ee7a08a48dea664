use crate::config::{AppConfig, DatasetConfig};
use crate::error::{PipelineError, Result};
use crate::imaging::{ImageCodec, ImageCrateCodec};
use crate::models::{Category, CategoryReport, FailureList, NormalizeSummary, RetrievalSummary, RunSummary, SearchResult};
use crate::rate_limit::{Clock, FixedPause, RateLimiter, TokioClock};
use crate::retrieval::Retriever;
use crate::{normalize, preview, query, verify};
use providers::duckduckgo::{DuckDuckGoConfig, DuckDuckGoSearch};
use providers::fixed::FixedSearch;
use providers::http::{HttpConfig, HttpDownloader, DEFAULT_USER_AGENT};
use providers::{Downloader, ImageSearch, ProviderRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The acquisition pipeline with its collaborators wired in.
pub struct Pipeline {
    search: Arc<dyn ImageSearch>,
    downloader: Arc<dyn Downloader>,
    codec: Arc<dyn ImageCodec>,
    limiter: Arc<dyn RateLimiter>,
    max_size: u32,
}

#[derive(Default)]
pub struct PipelineBuilder {
    search: Option<Arc<dyn ImageSearch>>,
    downloader: Option<Arc<dyn Downloader>>,
    codec: Option<Arc<dyn ImageCodec>>,
    limiter: Option<Arc<dyn RateLimiter>>,
    max_size: Option<u32>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: Arc<dyn ImageSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn downloader(mut self, downloader: Arc<dyn Downloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Shorthand for a [`FixedPause`] over `clock`.
    pub fn pause(self, interval: Duration, clock: Arc<dyn Clock>) -> Self {
        self.rate_limiter(Arc::new(FixedPause::new(interval, clock)))
    }

    pub fn max_size(mut self, max_size: u32) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Every collaborator must be supplied; nothing is defaulted.
    pub fn build(self) -> Result<Pipeline> {
        let missing = |what: &str| PipelineError::Config(format!("pipeline has no {what}"));
        let max_size = self.max_size.ok_or_else(|| missing("max image size"))?;
        if max_size == 0 {
            return Err(PipelineError::Config("max image size must be positive".into()));
        }
        Ok(Pipeline {
            search: self.search.ok_or_else(|| missing("search provider"))?,
            downloader: self.downloader.ok_or_else(|| missing("downloader"))?,
            codec: self.codec.ok_or_else(|| missing("image codec"))?,
            limiter: self.limiter.ok_or_else(|| missing("rate limiter"))?,
            max_size,
        })
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub async fn search(&self, term: &str, max_images: usize) -> Result<Vec<SearchResult>> {
        query::query(self.search.as_ref(), term, max_images).await
    }

    pub async fn retrieve(
        &self,
        category: &str,
        terms: &[String],
        dest: &Path,
        max_images: usize,
    ) -> Result<RetrievalSummary> {
        Retriever {
            search: self.search.as_ref(),
            downloader: self.downloader.as_ref(),
            limiter: self.limiter.as_ref(),
            max_images,
        }
        .retrieve(category, terms, dest)
        .await
    }

    pub async fn normalize(&self, dir: &Path) -> Result<NormalizeSummary> {
        normalize::normalize(self.codec.clone(), dir, self.max_size).await
    }

    pub async fn verify(&self, root: &Path) -> Result<FailureList> {
        verify::verify(self.codec.clone(), root).await
    }

    pub async fn preview(
        &self,
        url: &str,
        dest: &Path,
        width: u32,
        height: u32,
    ) -> Result<preview::Preview> {
        preview::preview(
            self.downloader.as_ref(),
            self.codec.clone(),
            url,
            dest,
            width,
            height,
        )
        .await
    }

    /// Retrieve then normalize each category in turn, then verify the whole
    /// base directory once.
    pub async fn run(&self, dataset: &DatasetConfig) -> Result<RunSummary> {
        let base = PathBuf::from(&dataset.base_path);
        let mut summary = RunSummary::default();

        for label in &dataset.categories {
            let category = Category::new(&base, label);
            info!(category = %category.label, "Starting retrieval phase...");
            let retrieval = self
                .retrieve(
                    &category.label,
                    &dataset.terms_for(&category.label),
                    &category.directory,
                    dataset.max_images,
                )
                .await?;
            info!(category = %category.label, "Starting resize phase...");
            let normalize = self.normalize(&category.directory).await?;
            summary.categories.push(CategoryReport {
                category: category.label,
                directory: category.directory,
                retrieval,
                normalize,
            });
        }

        info!("Starting verification phase...");
        summary.failed = self.verify(&base).await?;
        info!(
            categories = summary.categories.len(),
            removed = summary.failed.len(),
            "Pipeline complete."
        );
        Ok(summary)
    }
}

pub fn build_registry(config: &AppConfig) -> Result<ProviderRegistry> {
    let mut reg = ProviderRegistry::new().with_search(
        "fixed",
        Arc::new(FixedSearch::new(config.search.fixed_urls.iter().cloned())),
    );

    if config.search.provider == "duckduckgo" {
        let ddg = DuckDuckGoSearch::new(DuckDuckGoConfig {
            base_url: config.search.base_url.clone(),
            region: config.search.region.clone(),
            safe_search: config.search.safe_search,
            http: http_config(config),
        })?;
        reg = reg.with_search("duckduckgo", Arc::new(ddg));
    }

    Ok(reg.set_preferred_search(&config.search.provider))
}

pub fn http_config(config: &AppConfig) -> HttpConfig {
    HttpConfig {
        timeout: Duration::from_secs(config.search.timeout_secs.max(1)),
        user_agent: config
            .search
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
    }
}

/// Wires the production collaborators described by `config`.
pub fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let registry = build_registry(config)?;
    let search = registry.search(None)?;
    Pipeline::builder()
        .search(search)
        .downloader(Arc::new(HttpDownloader::new(&http_config(config))?))
        .codec(Arc::new(ImageCrateCodec))
        .pause(
            Duration::from_secs(config.rate_limit.pause_secs),
            Arc::new(TokioClock),
        )
        .max_size(config.resize.max_size)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reports_missing_collaborators() {
        let err = Pipeline::builder()
            .search(Arc::new(FixedSearch::new(Vec::<String>::new())))
            .codec(Arc::new(ImageCrateCodec))
            .max_size(400)
            .build()
            .err()
            .unwrap();
        match err {
            PipelineError::Config(msg) => assert!(msg.contains("downloader"), "{msg}"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.search.provider = "bing".to_string();
        assert!(matches!(
            build_pipeline(&cfg).err(),
            Some(PipelineError::Search(providers::ProviderError::UnknownProvider(_)))
        ));
    }

    #[test]
    fn fixed_provider_builds_offline() {
        let mut cfg = AppConfig::default();
        cfg.search.provider = "fixed".to_string();
        cfg.search.fixed_urls = vec!["https://img/1.jpg".to_string()];
        assert!(build_pipeline(&cfg).is_ok());
    }
}
