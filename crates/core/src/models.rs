use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use providers::SearchResult;

/// Paths removed by verification, in the order they were found.
pub type FailureList = Vec<PathBuf>;

/// A class label such as "bird" together with the directory its images live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub directory: PathBuf,
}

impl Category {
    pub fn new(base: &Path, label: &str) -> Self {
        Self {
            label: label.to_string(),
            directory: base.join(label),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalSummary {
    pub searched: usize,
    pub downloaded: usize,
    /// Hits whose URL had already been saved by an earlier variant.
    pub overwritten: usize,
    pub failed_downloads: usize,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeSummary {
    pub examined: usize,
    pub resized: usize,
    pub unchanged: usize,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub directory: PathBuf,
    pub retrieval: RetrievalSummary,
    pub normalize: NormalizeSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub categories: Vec<CategoryReport>,
    pub failed: FailureList,
}
