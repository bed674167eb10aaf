//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use super::app_config::LogLevel;

/// CLI for loading App Store artwork through the cache pipeline.
#[derive(Debug, Parser)]
#[command(
    name = "oxistore-artwork",
    version,
    about = "Load App Store artwork through the oxistore cache pipeline",
    long_about = None
)]
pub struct CliArgs {
    /// Artwork URLs to load.
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache root directory.
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Cache namespace.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Disk cache size budget in bytes.
    #[arg(long)]
    pub max_cache_size: Option<u64>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Scale factor applied to the artwork dimensions in each URL.
    #[arg(long)]
    pub scale: Option<f64>,
}
