//! Decoded bitmap type shared between the caches, the load task and the
//! display step.

use image::{DynamicImage, RgbaImage};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Requested display size, used both as a decode hint and as part of the
/// memory cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

struct BitmapInner {
    pixels: RgbaImage,
    recycled: AtomicBool,
}

/// Decoded RGBA8 image.
///
/// Clones share the same pixel buffer. A bitmap can be recycled by its owner,
/// after which caches treat it as absent.
#[derive(Clone)]
pub struct Bitmap {
    inner: Arc<BitmapInner>,
}

impl Bitmap {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            inner: Arc::new(BitmapInner {
                pixels,
                recycled: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_image(image: DynamicImage) -> Self {
        Self::from_rgba(image.into_rgba8())
    }

    pub fn width(&self) -> u32 {
        self.inner.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.inner.pixels
    }

    /// Size of the pixel buffer in bytes
    pub fn byte_size(&self) -> usize {
        self.inner.pixels.as_raw().len()
    }

    /// Mark the bitmap as disposed. Every clone observes the flag.
    pub fn recycle(&self) {
        self.inner.recycled.store(true, Ordering::Release);
    }

    pub fn is_recycled(&self) -> bool {
        self.inner.recycled.load(Ordering::Acquire)
    }

    /// A bitmap is usable when it has positive dimensions and was not recycled
    pub fn is_valid(&self) -> bool {
        !self.is_recycled() && self.width() > 0 && self.height() > 0
    }

    /// True if both handles point at the same pixel buffer
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("dimensions", &(self.width(), self.height()))
            .field("recycled", &self.is_recycled())
            .finish()
    }
}
