use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use futures_util::future::join_all;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use oxistore_artwork::domain::ImageStatus;
use oxistore_artwork::infrastructure::{
    AppConfig, CliArgs, DiskImageCache, HttpFetcher, ImageLoader, scale_artwork_url,
};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let mut config = AppConfig::load(args.config.as_deref());
    config.merge_with_args(&args);

    init_logging(&config)?;

    info!(version = oxistore_artwork::VERSION, "Starting artwork loader");

    let cache = Arc::new(match &config.cache_dir {
        Some(dir) => DiskImageCache::open(dir.clone(), config.max_cache_size).await?,
        None => DiskImageCache::default_location(config.max_cache_size).await?,
    });
    let fetcher = Arc::new(HttpFetcher::with_timeout(Duration::from_secs(
        config.timeout_secs,
    ))?);

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();

    let loaders: Vec<ImageLoader> = args
        .urls
        .iter()
        .map(|url| {
            let url = match args.scale {
                Some(scale) => scale_artwork_url(url, scale),
                None => url.clone(),
            };
            ImageLoader::new(
                url,
                config.namespace.clone(),
                cache.clone(),
                fetcher.clone(),
                &event_tx,
            )
        })
        .collect();
    drop(event_tx);

    let statuses = join_all(loaders.iter().map(ImageLoader::finished)).await;

    while let Ok(loaded) = event_rx.try_recv() {
        println!(
            "{} {}x{} ({})",
            loaded.url,
            loaded.image.width(),
            loaded.image.height(),
            loaded.source
        );
    }

    let mut failures = 0usize;
    for (loader, status) in loaders.iter().zip(&statuses) {
        if let ImageStatus::Failed(reason) = status {
            eprintln!("failed: {} ({reason})", loader.url());
            failures += 1;
        }
    }

    info!(
        loaded = statuses.len() - failures,
        failed = failures,
        cache_entries = cache.len(),
        cache_bytes = cache.current_size(),
        "done"
    );

    if failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}
