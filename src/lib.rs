//! Album-Ripper: a patient gallery album downloader
//!
//! This crate walks a paginated gallery album, resolves every picture page to its
//! full-resolution image and stores the images on disk, one album at a time,
//! surviving transient network failures and server-side rate limiting.

pub mod config;
pub mod crawler;
pub mod download;
pub mod pipeline;
pub mod progress;
pub mod storage;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Album-Ripper operations
///
/// Every variant except [`RipperError::Interrupted`] is structural: it means the
/// site layout no longer matches what the crawler expects, or the local
/// environment is unusable. Per-image failures never surface here.
#[derive(Debug, Error)]
pub enum RipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Error fetching page {url}: {source}")]
    PageFetch { url: String, source: reqwest::Error },

    #[error("Unexpected page layout at {url}: {message}")]
    Layout { url: String, message: String },

    #[error("Error creating directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error reading URL list {}: {source}", path.display())]
    UrlList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Session log error for {}: {source}", path.display())]
    SessionLog {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTML selector error: {0}")]
    Selector(String),

    #[error("Run interrupted by user")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Album-Ripper operations
pub type Result<T> = std::result::Result<T, RipperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{extract_picture_pages, reload, Crawler, PageDocument, PageFetcher};
pub use download::{AlbumDownloader, AlbumReport, HeaderFactory, RetryingFetcher};
pub use pipeline::{run, RunSummary};
pub use progress::{ProgressReporter, TaskHandle};
pub use storage::sanitize_directory_name;
