mod fetch_port;
mod image_cache_port;

pub use fetch_port::FetchPort;
pub use image_cache_port::{CacheError, CacheResult, ImageCachePort};

#[cfg(test)]
pub mod mocks {
    pub use super::fetch_port::MockFetchPort;
    pub use super::image_cache_port::mock::{MemoryCacheFake, WriteFailingCache};
}
