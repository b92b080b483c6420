//! Image download layer
//!
//! # Components
//!
//! - `headers`: randomized, host-scoped request headers
//! - `retry`: retries, backoff and rate-limit cooldowns around one GET
//! - `pause`: the [`Sleeper`] seam behind every delay
//! - `album`: per-album orchestration over crawler, fetcher and storage

mod album;
mod headers;
mod pause;
mod retry;

pub use album::{AlbumDownloader, AlbumReport, DownloadContext};
pub use headers::{host_header, HeaderFactory, DEFAULT_USER_AGENT, FIREFOX_USER_AGENTS};
pub use pause::{random_pause, RecordingSleeper, Sleeper, TokioSleeper};
pub use retry::{
    backoff_delay, build_download_client, AttemptOutcome, RetryPolicy, RetryingFetcher,
};
