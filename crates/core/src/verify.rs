//! Walks a tree, removes every image file that fails to decode and reports
//! what it removed. This is the only cleanup the pipeline has; retrieval and
//! normalization both leave broken files for it.

use crate::error::{PipelineError, Result};
use crate::imaging::{is_image_path, ImageCodec};
use crate::models::FailureList;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

pub async fn verify(codec: Arc<dyn ImageCodec>, root: &Path) -> Result<FailureList> {
    let root = root.to_path_buf();
    task::spawn_blocking(move || verify_blocking(codec.as_ref(), &root))
        .await
        .map_err(|e| PipelineError::Config(format!("verify task failed: {e}")))?
}

fn verify_blocking(codec: &dyn ImageCodec, root: &Path) -> Result<FailureList> {
    if let Err(e) = fs::metadata(root) {
        return Err(PipelineError::io(root, e));
    }

    let mut failed = Vec::new();
    for path in image_files(root) {
        match codec.check(&path) {
            Ok(()) => {}
            Err(e @ (PipelineError::Decode { .. } | PipelineError::Io { .. })) => {
                debug!(path = %path.display(), error = %e, "removing broken image");
                fs::remove_file(&path).map_err(|err| PipelineError::io(&path, err))?;
                failed.push(path);
            }
            Err(e) => return Err(e),
        }
    }

    if failed.is_empty() {
        info!(root = %root.display(), "all images decoded");
    } else {
        info!(
            root = %root.display(),
            "Images that failed to download: {:?}",
            failed
        );
    }
    Ok(failed)
}

/// Image files under `root`, depth first, sorted by name within a directory.
/// Hidden entries are skipped.
fn image_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && is_image_path(path) {
            files.push(path.to_path_buf());
        }
    }
    files
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::fixtures::{write_jpeg, write_png};
    use crate::imaging::ImageCrateCodec;

    fn codec() -> Arc<dyn ImageCodec> {
        Arc::new(ImageCrateCodec)
    }

    #[tokio::test]
    async fn zero_byte_file_is_removed_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_jpeg(&dir.path().join("a.jpg"), 32, 32);
        write_jpeg(&dir.path().join("b.jpg"), 48, 24);
        let empty = dir.path().join("c.jpg");
        fs::write(&empty, b"").unwrap();

        let failed = verify(codec(), dir.path()).await.unwrap();
        assert_eq!(failed, vec![empty.clone()]);
        assert!(!empty.exists());
        assert!(dir.path().join("a.jpg").exists());
        assert!(dir.path().join("b.jpg").exists());
    }

    #[tokio::test]
    async fn recurses_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let bird = dir.path().join("bird");
        let forest = dir.path().join("forest");
        fs::create_dir_all(&bird).unwrap();
        fs::create_dir_all(&forest).unwrap();
        write_png(&bird.join("ok.png"), 10, 10);
        fs::write(bird.join("html.jpg"), b"<html>429 Too Many Requests</html>").unwrap();
        fs::write(forest.join("cut.png"), b"\x89PNG\r\n\x1a\n").unwrap();
        fs::write(forest.join("readme.txt"), b"not an image").unwrap();

        let first = verify(codec(), dir.path()).await.unwrap();
        assert_eq!(first, vec![bird.join("html.jpg"), forest.join("cut.png")]);
        assert!(forest.join("readme.txt").exists());

        let second = verify(codec(), dir.path()).await.unwrap();
        assert!(second.is_empty());
        assert!(bird.join("ok.png").exists());
    }

    #[tokio::test]
    async fn hidden_entries_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = dir.path().join(".cache");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("x.jpg"), b"").unwrap();
        assert!(verify(codec(), dir.path()).await.unwrap().is_empty());
        assert!(hidden.join("x.jpg").exists());
    }

    #[tokio::test]
    async fn missing_root_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify(codec(), &dir.path().join("absent")).await;
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}
