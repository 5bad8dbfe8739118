// Tsubame image loader library
//
// Loads images into display targets through a memory cache, a disk cache and
// the network, dropping work whose target has been recycled or destroyed.

pub mod cache;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod logging;
pub mod transport;

pub use cache::{memory_cache_key, ImageCache};
pub use config::LoaderConfig;
pub use decoder::{Bitmap, ImageSize};
pub use error::LoadError;
pub use loader::{DisplayTarget, ImageLoader, ImageLoadingListener, LoadHandle, UiQueue};
