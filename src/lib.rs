//! oxistore-artwork - Artwork loading and caching for the oxistore client.
//!
//! This crate provides the image pipeline used by the oxistore App Store
//! client: bounded-retry HTTP downloads, a content-addressed on-disk cache,
//! and a per-request loader that bridges the two and publishes decoded
//! images to the consumer's event loop.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for network and disk.
pub mod infrastructure;

/// Current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "oxistore";
