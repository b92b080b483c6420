//! Page fetcher for album and picture pages
//!
//! Structural pages are fetched exactly once. Any transport or HTTP error is
//! returned as [`RipperError::PageFetch`] and ends the run: a page that cannot
//! be fetched means the album cannot be walked, and retries are reserved for
//! image downloads.

use super::document::PageDocument;
use crate::download::DEFAULT_USER_AGENT;
use crate::{Result, RipperError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client used for page fetches
pub fn build_page_client(timeout: Duration) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}

/// Fetches URLs and parses them into [`PageDocument`]s
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher with its own client and the given timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_page_client(timeout)?,
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a page with a single GET request
    ///
    /// # Returns
    ///
    /// * `Ok(PageDocument)` - The page body, parsed lazily on query
    /// * `Err(RipperError)` - Invalid URL, transport failure, or non-2xx status
    pub async fn fetch(&self, url: &str) -> Result<PageDocument> {
        let parsed = Url::parse(url)?;
        tracing::debug!("Fetching page {}", parsed);

        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| page_error(url, source))?;

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|source| page_error(url, source))?;

        Ok(PageDocument::new(final_url, body))
    }
}

fn page_error(url: &str, source: reqwest::Error) -> RipperError {
    tracing::error!("Error fetching page {}: {}", url, source);
    RipperError::PageFetch {
        url: url.to_string(),
        source,
    }
}
