//! Searches each query variant for a category and saves every hit into the
//! category directory. Individual downloads are allowed to fail; whatever
//! they leave behind is cleaned up by verification.

use crate::error::{PipelineError, Result};
use crate::imaging::{is_image_path, IMAGE_EXTENSIONS};
use crate::models::RetrievalSummary;
use crate::query::query;
use crate::rate_limit::RateLimiter;
use providers::{Downloader, ImageSearch};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const FALLBACK_EXTENSION: &str = "jpg";

pub struct Retriever<'a> {
    pub search: &'a dyn ImageSearch,
    pub downloader: &'a dyn Downloader,
    pub limiter: &'a dyn RateLimiter,
    pub max_images: usize,
}

impl<'a> Retriever<'a> {
    /// Runs every term in order, downloads the results into `dest`, then
    /// waits on the rate limiter before handing control back.
    pub async fn retrieve(
        &self,
        category: &str,
        terms: &[String],
        dest: &Path,
    ) -> Result<RetrievalSummary> {
        ensure_dir(dest).await?;
        let mut summary = RetrievalSummary::default();

        for term in terms {
            let results = query(self.search, term, self.max_images).await?;
            summary.searched += results.len();
            for result in results {
                match download_one(self.downloader, &result.image_url, dest).await {
                    Ok(path) if summary.files.contains(&path) => {
                        debug!(path = %path.display(), "same image from another variant, overwritten");
                        summary.overwritten += 1;
                    }
                    Ok(path) => {
                        summary.downloaded += 1;
                        summary.files.push(path);
                    }
                    Err(PipelineError::Download { url, reason }) => {
                        debug!(%url, %reason, "download failed, leaving it for verification");
                        summary.failed_downloads += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if summary.failed_downloads > 0 {
            warn!(
                category,
                failed = summary.failed_downloads,
                "some downloads failed"
            );
        }
        info!(
            category,
            downloaded = summary.downloaded,
            dest = %dest.display(),
            "retrieval complete"
        );
        self.limiter.after_batch(category).await;
        Ok(summary)
    }
}

pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PipelineError::io(dir, e))
}

/// Fetches `url` into `dest`. Network problems come back as
/// [`PipelineError::Download`]; a failed write is an [`PipelineError::Io`].
pub async fn download_one(downloader: &dyn Downloader, url: &str, dest: &Path) -> Result<PathBuf> {
    let bytes = downloader
        .fetch(url)
        .await
        .map_err(|e| PipelineError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    let path = dest.join(file_name_for(url, &bytes));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| PipelineError::io(&path, e))?;
    debug!(%url, path = %path.display(), bytes = bytes.len(), "saved");
    Ok(path)
}

/// Stable name derived from the URL, so fetching the same image twice
/// overwrites instead of duplicating.
pub fn file_name_for(url: &str, bytes: &[u8]) -> String {
    let digest = blake3::hash(url.as_bytes()).to_hex();
    format!("{}.{}", &digest.as_str()[..16], extension_for(url, bytes))
}

/// Sniffed image types outside [`IMAGE_EXTENSIONS`] are not trusted: the
/// file has to keep a name that verification will pick up.
fn extension_for(url: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() == infer::MatcherType::Image
            && IMAGE_EXTENSIONS.contains(&kind.extension())
        {
            return kind.extension().to_string();
        }
    }
    let path_part = url.split(['?', '#']).next().unwrap_or(url);
    let candidate = Path::new(path_part);
    if is_image_path(candidate) {
        if let Some(ext) = candidate.extension().and_then(|e| e.to_str()) {
            return ext.to_lowercase();
        }
    }
    FALLBACK_EXTENSION.to_string()
}
