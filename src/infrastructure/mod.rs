//! Infrastructure layer with network and disk adapters.

/// Application configuration.
pub mod config;
/// Artwork handling (disk caching, loading, URL scaling).
pub mod image;
/// HTTP byte downloads.
pub mod net;

pub use config::{AppConfig, CliArgs, LogLevel};
pub use image::{
    DEFAULT_NAMESPACE, DiskImageCache, ImageLoader, scale_artwork_url, scale_artwork_url_default,
};
pub use net::HttpFetcher;
