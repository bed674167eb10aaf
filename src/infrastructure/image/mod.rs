//! Artwork handling infrastructure.
//!
//! This module provides:
//! - Disk caching keyed by URL-path fingerprints
//! - A per-request async loading pipeline
//! - App Store artwork URL scaling

pub mod artwork_url;
pub mod disk_cache;
pub mod loader;

pub use artwork_url::{scale_artwork_url, scale_artwork_url_default};
pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache};
pub use loader::{DEFAULT_NAMESPACE, ImageLoader};
