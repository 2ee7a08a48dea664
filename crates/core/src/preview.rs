//! Single-image fetch for eyeballing what a search returns before running a
//! whole category.

use crate::error::{PipelineError, Result};
use crate::imaging::ImageCodec;
use crate::retrieval::{download_one, ensure_dir};
use providers::Downloader;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub image: PathBuf,
    pub thumbnail: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Downloads `url` into `dest` and writes a thumbnail bounded by
/// `width` x `height` next to it. Unlike retrieval, a failed download is
/// returned to the caller.
pub async fn preview(
    downloader: &dyn Downloader,
    codec: Arc<dyn ImageCodec>,
    url: &str,
    dest: &Path,
    width: u32,
    height: u32,
) -> Result<Preview> {
    ensure_dir(dest).await?;
    let image = download_one(downloader, url, dest).await?;
    let thumbnail = thumbnail_path(&image);

    let (src, out) = (image.clone(), thumbnail.clone());
    let (w, h) = task::spawn_blocking(move || codec.thumbnail(&src, &out, width, height))
        .await
        .map_err(|e| PipelineError::Config(format!("thumbnail task failed: {e}")))??;

    info!(image = %image.display(), thumbnail = %thumbnail.display(), w, h, "preview ready");
    Ok(Preview {
        image,
        thumbnail,
        width: w,
        height: h,
    })
}

fn thumbnail_path(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("preview");
    image.with_file_name(format!("{stem}_thumb.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ImageCrateCodec;
    use bytes::Bytes;
    use providers::ProviderError;
    use std::io::Cursor;

    struct OneImage(Vec<u8>);

    #[async_trait::async_trait]
    impl Downloader for OneImage {
        async fn fetch(&self, url: &str) -> std::result::Result<Bytes, ProviderError> {
            if url.ends_with("missing.jpg") {
                return Err(ProviderError::RequestFailed("status 404".into()));
            }
            Ok(Bytes::from(self.0.clone()))
        }
    }

    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageOutputFormat::Jpeg(80)).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn writes_image_and_bounded_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = OneImage(jpeg_bytes(600, 300));
        let p = preview(
            &downloader,
            Arc::new(ImageCrateCodec),
            "https://img/bird.jpg",
            dir.path(),
            256,
            256,
        )
        .await
        .unwrap();
        assert!(p.image.exists());
        assert!(p.thumbnail.exists());
        assert_eq!((p.width, p.height), (256, 128));
        assert!(p.thumbnail.to_string_lossy().ends_with("_thumb.png"));
    }

    #[tokio::test]
    async fn failed_download_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = OneImage(Vec::new());
        let result = preview(
            &downloader,
            Arc::new(ImageCrateCodec),
            "https://img/missing.jpg",
            dir.path(),
            256,
            256,
        )
        .await;
        assert!(matches!(result, Err(PipelineError::Download { .. })));
    }
}
