//! Image decoding and resizing behind a small trait so stages can be driven
//! without touching real codecs.

use crate::error::{PipelineError, Result};
use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{GenericImageView, ImageError, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions treated as image files by normalization and verification.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff", "ico",
];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    Resized { from: (u32, u32), to: (u32, u32) },
    Unchanged,
    /// Decoded fine but the format cannot be written back at the new size.
    Unsupported,
}

pub trait ImageCodec: Send + Sync {
    /// Fully decodes the file; any failure means the file is unusable.
    fn check(&self, path: &Path) -> Result<()>;

    /// Shrinks the image in place so its largest side is at most `max_size`.
    fn resize_to_fit(&self, path: &Path, max_size: u32) -> Result<ResizeOutcome>;

    /// Writes a copy bounded by `width` x `height` to `dest`, keeping aspect ratio.
    fn thumbnail(&self, src: &Path, dest: &Path, width: u32, height: u32) -> Result<(u32, u32)>;
}

#[derive(Debug, Default, Clone)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    fn decode(path: &Path) -> Result<(image::DynamicImage, Option<ImageFormat>)> {
        let reader = ImageReader::open(path)
            .map_err(|e| PipelineError::io(path, e))?
            .with_guessed_format()
            .map_err(|e| PipelineError::io(path, e))?;
        let format = reader.format();
        let img = reader
            .decode()
            .map_err(|e| PipelineError::decode(path, e))?;
        Ok((img, format))
    }
}

impl ImageCodec for ImageCrateCodec {
    fn check(&self, path: &Path) -> Result<()> {
        Self::decode(path).map(|_| ())
    }

    fn resize_to_fit(&self, path: &Path, max_size: u32) -> Result<ResizeOutcome> {
        let (img, format) = Self::decode(path)?;
        let (w, h) = img.dimensions();
        if w.max(h) <= max_size {
            return Ok(ResizeOutcome::Unchanged);
        }
        let Some(format) = format.or_else(|| ImageFormat::from_path(path).ok()) else {
            return Ok(ResizeOutcome::Unsupported);
        };

        let resized = img.resize(max_size, max_size, FilterType::Lanczos3);
        let staging = staging_path(path);
        if let Err(e) = resized.save_with_format(&staging, format) {
            let _ = fs::remove_file(&staging);
            return encode_failure(&staging, e);
        }
        fs::rename(&staging, path).map_err(|e| PipelineError::io(path, e))?;
        Ok(ResizeOutcome::Resized {
            from: (w, h),
            to: resized.dimensions(),
        })
    }

    fn thumbnail(&self, src: &Path, dest: &Path, width: u32, height: u32) -> Result<(u32, u32)> {
        let (img, _) = Self::decode(src)?;
        let thumb = img.thumbnail(width, height);
        thumb.save(dest).map_err(|e| save_error(dest, e))?;
        Ok(thumb.dimensions())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".resizing");
    path.with_file_name(name)
}

/// A format we can read but not write back at the new size (no encoder, or
/// an encoder limit such as ico's 256 px) leaves the file as it is.
fn encode_failure(path: &Path, err: ImageError) -> Result<ResizeOutcome> {
    match err {
        ImageError::Unsupported(_) | ImageError::Parameter(_) | ImageError::Encoding(_) => {
            Ok(ResizeOutcome::Unsupported)
        }
        other => Err(save_error(path, other)),
    }
}

fn save_error(path: &Path, err: ImageError) -> PipelineError {
    match err {
        ImageError::IoError(e) => PipelineError::io(path, e),
        other => PipelineError::decode(path, other),
    }
}
