use crate::error::{PipelineError, Result};
use crate::models::SearchResult;
use providers::ImageSearch;
use tracing::{debug, info};

pub const DEFAULT_MAX_IMAGES: usize = 30;

/// Runs one search against the provider.
///
/// The provider is known to return the odd malformed response; a failure
/// surfaces as [`PipelineError::Search`] and the caller decides whether to
/// try again.
pub async fn query(
    provider: &dyn ImageSearch,
    term: &str,
    max_images: usize,
) -> Result<Vec<SearchResult>> {
    let term = term.trim();
    if term.is_empty() {
        return Err(PipelineError::InvalidTerm);
    }
    if max_images == 0 {
        return Ok(Vec::new());
    }
    info!("Searching for '{}'", term);
    let mut results = provider.search(term, max_images).await?;
    results.truncate(max_images);
    debug!(term, count = results.len(), "search complete");
    Ok(results)
}
