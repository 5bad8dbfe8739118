//! Image decoding
//!
//! The loader decodes through the [`ImageDecoder`] trait so tests can swap in
//! counting or failing decoders. [`RasterDecoder`] is the production
//! implementation backed by the `image` crate.
//!
//! Decoding is CPU bound and synchronous; the load task runs it on the
//! blocking pool.

mod bitmap;

pub use bitmap::{Bitmap, ImageSize};

use bytes::Bytes;
use image::io::{Limits, Reader as ImageReader};
use image::ImageError;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::DecoderConfig;

/// Where the bytes to decode come from
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A persisted blob, typically a disk cache entry
    File(PathBuf),
    /// Bytes already in memory
    Bytes(Bytes),
}

impl ImageSource {
    /// Origin tag used in logs
    pub fn origin(&self) -> &'static str {
        match self {
            ImageSource::File(_) => "file",
            ImageSource::Bytes(_) => "stream",
        }
    }
}

/// Decoder failures
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error while decoding: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt image data: {0}")]
    Corrupt(String),

    #[error("unsupported image format: {0}")]
    Unsupported(String),

    #[error("decode exceeded allocation limit: {0}")]
    OutOfMemory(String),
}

impl From<ImageError> for DecodeError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::IoError(e) => DecodeError::Io(e),
            ImageError::Limits(e) => DecodeError::OutOfMemory(e.to_string()),
            ImageError::Unsupported(e) => DecodeError::Unsupported(e.to_string()),
            other => DecodeError::Corrupt(other.to_string()),
        }
    }
}

/// Turns a byte source into a bitmap sized for the target
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, source: &ImageSource, target_size: ImageSize) -> Result<Bitmap, DecodeError>;
}

/// Decoder for the raster formats compiled into the `image` crate
#[derive(Debug, Clone)]
pub struct RasterDecoder {
    max_alloc_bytes: u64,
}

impl RasterDecoder {
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            max_alloc_bytes: config.max_alloc_bytes(),
        }
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}

impl Default for RasterDecoder {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, source: &ImageSource, target_size: ImageSize) -> Result<Bitmap, DecodeError> {
        let image = match source {
            ImageSource::File(path) => {
                let mut reader = ImageReader::open(path)?.with_guessed_format()?;
                reader.limits(self.limits());
                reader.decode()?
            }
            ImageSource::Bytes(bytes) => {
                let mut reader = ImageReader::new(Cursor::new(bytes.as_ref())).with_guessed_format()?;
                reader.limits(self.limits());
                reader.decode()?
            }
        };

        let factor = sample_factor(image.width(), image.height(), target_size);
        let image = if factor > 1 {
            image.thumbnail_exact(image.width() / factor, image.height() / factor)
        } else {
            image
        };

        Ok(Bitmap::from_image(image))
    }
}

/// Largest power of two that keeps both dimensions at or above the target.
/// A zero target dimension disables downsampling.
pub fn sample_factor(width: u32, height: u32, target: ImageSize) -> u32 {
    if target.width == 0 || target.height == 0 {
        return 1;
    }
    let mut factor = 1u32;
    while width / (factor * 2) >= target.width && height / (factor * 2) >= target.height {
        factor *= 2;
    }
    factor
}
