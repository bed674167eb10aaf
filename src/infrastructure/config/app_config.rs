//! Application configuration.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::infrastructure::image::disk_cache::DEFAULT_MAX_CACHE_SIZE;
use crate::infrastructure::image::loader::DEFAULT_NAMESPACE;

const APP_NAME: &str = "oxistore";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "oxistore";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Artwork pipeline configuration, loadable from a TOML file and
/// overridable from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Cache root directory; platform cache directory when absent.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Cache namespace for artwork entries.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Disk cache size budget in bytes.
    #[serde(default = "default_max_cache_size")]
    pub max_cache_size: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path; stderr only when absent.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            namespace: default_namespace(),
            max_cache_size: default_max_cache_size(),
            timeout_secs: default_timeout_secs(),
            log_level: LogLevel::default(),
            log_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `path`, or from the default location
    /// when `path` is `None`. A missing file yields defaults; an invalid
    /// one is reported and ignored.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);

        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };

        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config file, using defaults");
                Self::default()
            }
        }
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME).map_or_else(
            || PathBuf::from("config.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }

    /// Merges CLI arguments into the configuration. Arguments win.
    pub fn merge_with_args(&mut self, args: &super::CliArgs) {
        if let Some(cache_dir) = &args.cache_dir {
            self.cache_dir = Some(cache_dir.clone());
        }
        if let Some(namespace) = &args.namespace {
            self.namespace.clone_from(namespace);
        }
        if let Some(max_cache_size) = args.max_cache_size {
            self.max_cache_size = max_cache_size;
        }
        if let Some(timeout_secs) = args.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_max_cache_size() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

fn default_timeout_secs() -> u64 {
    60
}
