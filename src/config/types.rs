use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Album-Ripper
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
}

/// Where input is read from and output is written to
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PathsConfig {
    /// Root directory under which one directory per album is created
    pub download_root: String,

    /// Newline-separated list of album root URLs
    pub urls_file: String,

    /// Append-only list of image URLs that failed during the current run
    pub session_log: String,

    /// Truncate the URL list once every album in it was processed
    pub clear_urls_on_success: bool,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            download_root: "Downloads".to_string(),
            urls_file: "URLs.txt".to_string(),
            session_log: "session_log.txt".to_string(),
            clear_urls_on_success: true,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Timeout for album and picture page fetches (seconds)
    pub page_timeout_secs: u64,

    /// Timeout for image downloads (seconds)
    pub download_timeout_secs: u64,

    /// Referer sent with image requests
    pub referer: String,

    /// Write buffer size used when streaming images to disk (bytes)
    pub chunk_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 10,
            download_timeout_secs: 30,
            referer: "https://e-hentai.org/".to_string(),
            chunk_size: 16 * 1024,
        }
    }
}

impl HttpConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Retry behavior for image downloads
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Attempts per image, including the first one
    pub max_attempts: u32,

    /// Pause after an HTTP 429 response (seconds)
    pub rate_limit_cooldown_secs: u64,

    /// Cooldowns allowed per image before a 429 starts consuming attempts
    pub max_rate_limit_pauses: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_cooldown_secs: 60,
            max_rate_limit_pauses: 10,
        }
    }
}

impl RetryConfig {
    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limit_cooldown_secs)
    }
}

/// Randomized pauses between requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    /// Lower bound of the pause between album pages (seconds)
    pub page_pause_min_secs: f64,

    /// Upper bound of the pause between album pages (seconds)
    pub page_pause_max_secs: f64,

    /// Lower bound of the pause between images of one page (seconds)
    pub image_pause_min_secs: f64,

    /// Upper bound of the pause between images of one page (seconds)
    pub image_pause_max_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            page_pause_min_secs: 1.0,
            page_pause_max_secs: 5.0,
            image_pause_min_secs: 1.5,
            image_pause_max_secs: 4.0,
        }
    }
}
