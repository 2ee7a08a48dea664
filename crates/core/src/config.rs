use crate::query::DEFAULT_MAX_IMAGES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub search: SearchConfig,
    pub resize: ResizeConfig,
    pub rate_limit: RateLimitConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub base_path: String,
    pub categories: Vec<String>,
    /// Appended to each category to form the search terms, e.g. "bird sun photo".
    pub query_variants: Vec<String>,
    pub max_images: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_path: "bird_or_not".to_string(),
            categories: vec!["bird".to_string(), "forest".to_string()],
            query_variants: vec![
                "photo".to_string(),
                "sun photo".to_string(),
                "shade photo".to_string(),
            ],
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}

impl DatasetConfig {
    /// Search terms for one category, in the order they are queried.
    pub fn terms_for(&self, category: &str) -> Vec<String> {
        if self.query_variants.is_empty() {
            return vec![category.to_string()];
        }
        self.query_variants
            .iter()
            .map(|v| format!("{} {}", category, v.trim()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// `duckduckgo` or `fixed`.
    pub provider: String,
    pub base_url: String,
    pub region: String,
    pub safe_search: bool,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    /// Result URLs served by the `fixed` provider.
    pub fixed_urls: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "duckduckgo".to_string(),
            base_url: "https://duckduckgo.com".to_string(),
            region: "us-en".to_string(),
            safe_search: true,
            timeout_secs: 30,
            user_agent: None,
            fixed_urls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub max_size: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self { max_size: 400 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub pause_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { pause_secs: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub thumb_width: u32,
    pub thumb_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            thumb_width: 256,
            thumb_height: 256,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dataset.categories.is_empty() {
            anyhow::bail!("dataset.categories must name at least one category");
        }
        if self.dataset.categories.iter().any(|c| c.trim().is_empty()) {
            anyhow::bail!("dataset.categories contains an empty label");
        }
        if self.dataset.max_images == 0 {
            anyhow::bail!("dataset.max_images must be positive");
        }
        if self.resize.max_size == 0 {
            anyhow::bail!("resize.max_size must be positive");
        }
        if self.preview.thumb_width == 0 || self.preview.thumb_height == 0 {
            anyhow::bail!("preview thumbnail bounds must be positive");
        }
        Ok(())
    }
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("BIRDNOT")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg: AppConfig = settings.build()?.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
}
