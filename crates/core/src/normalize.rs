//! Shrinks every image directly inside a directory to a bounded size.
//!
//! Files that do not decode are skipped and logged, not removed: deleting
//! broken images is verification's job.

use crate::error::{PipelineError, Result};
use crate::imaging::{is_image_path, ImageCodec, ResizeOutcome};
use crate::models::NormalizeSummary;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

pub async fn normalize(
    codec: Arc<dyn ImageCodec>,
    dir: &Path,
    max_size: u32,
) -> Result<NormalizeSummary> {
    let dir = dir.to_path_buf();
    task::spawn_blocking(move || normalize_blocking(codec.as_ref(), &dir, max_size))
        .await
        .map_err(|e| PipelineError::Config(format!("resize task failed: {e}")))?
}

fn normalize_blocking(codec: &dyn ImageCodec, dir: &Path, max_size: u32) -> Result<NormalizeSummary> {
    let mut summary = NormalizeSummary::default();
    for path in list_images(dir)? {
        summary.examined += 1;
        match codec.resize_to_fit(&path, max_size) {
            Ok(ResizeOutcome::Resized { from, to }) => {
                debug!(path = %path.display(), ?from, ?to, "resized");
                summary.resized += 1;
            }
            Ok(ResizeOutcome::Unchanged) => summary.unchanged += 1,
            Ok(ResizeOutcome::Unsupported) => {
                warn!(path = %path.display(), "format cannot be re-encoded, left as is");
                summary.skipped.push(path);
            }
            Err(PipelineError::Decode { path, reason }) => {
                debug!(path = %path.display(), %reason, "skipping undecodable file");
                summary.skipped.push(path);
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        dir = %dir.display(),
        resized = summary.resized,
        skipped = summary.skipped.len(),
        "normalization complete"
    );
    Ok(summary)
}

/// Image files directly under `dir`, sorted by path.
fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && is_image_path(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
