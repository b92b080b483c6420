//! Bounded retries for image requests
//!
//! Each attempt is classified into an [`AttemptOutcome`]:
//! - success (2xx) ends the sequence with the response
//! - rate limited (429) pauses for the cooldown without using an attempt
//! - transient (other statuses, timeouts, connection errors) backs off and retries
//! - permanent (any other request error) aborts the sequence
//!
//! Every attempt that does not succeed emits exactly one progress event.

use crate::config::RetryConfig;
use crate::progress::{category, ProgressReporter};
use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use super::pause::Sleeper;

/// Limits of one retry sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one, at least 1
    pub max_attempts: u32,

    /// Pause after a 429 response
    pub rate_limit_cooldown: Duration,

    /// 429 pauses allowed per sequence before a 429 counts as a failed attempt
    pub max_rate_limit_pauses: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            rate_limit_cooldown: config.rate_limit_cooldown(),
            max_rate_limit_pauses: config.max_rate_limit_pauses,
        }
    }
}

/// Classification of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(Response),
    RateLimited,
    Transient(String),
    Permanent(String),
}

impl AttemptOutcome {
    fn from_response(response: Response) -> Self {
        let status = response.status();
        if status.is_success() {
            Self::Success(response)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::Transient(format!("HTTP {}", status))
        }
    }

    fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Transient("Timeout".to_string())
        } else if is_dns_error(error) {
            Self::Permanent(format!("DNS resolution failed ({})", error))
        } else if error.is_connect() {
            Self::Transient(format!("Connection error ({})", error))
        } else {
            Self::Permanent(error.to_string())
        }
    }
}

/// Whether a request failed because the host name could not be resolved
///
/// reqwest reports resolver failures as connect errors; the cause is only
/// visible further down the source chain.
fn is_dns_error(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(error);
    while let Some(cause) = source {
        let message = cause.to_string().to_lowercase();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}

/// Delay before the retry that follows the failed attempt `attempt` (0-based)
///
/// `2^(attempt + 1)` seconds plus a uniform jitter in `[1, 2)` seconds.
pub fn backoff_delay<R: Rng + ?Sized>(attempt: u32, rng: &mut R) -> Duration {
    let base = 2u64.saturating_pow(attempt.saturating_add(1));
    Duration::from_secs(base) + Duration::from_secs_f64(rng.gen_range(1.0..2.0))
}

/// Builds the HTTP client used for image downloads
pub fn build_download_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}

/// Wraps a single GET with retries, backoff and rate-limit cooldowns
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
    reporter: Arc<dyn ProgressReporter>,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryingFetcher {
    pub fn new(
        client: Client,
        policy: RetryPolicy,
        reporter: Arc<dyn ProgressReporter>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            client,
            policy,
            reporter,
            sleeper,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, returning the successful response with its body unread
    ///
    /// Returns `None` when every attempt failed or a permanent error aborted
    /// the sequence; the cause has already been reported.
    pub async fn fetch_with_retries<R: Rng + ?Sized>(
        &self,
        url: &str,
        headers: &HeaderMap,
        rng: &mut R,
    ) -> Option<Response> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut pauses = 0;

        while attempt < max_attempts {
            let reason = match self.attempt(url, headers).await {
                AttemptOutcome::Success(response) => return Some(response),
                AttemptOutcome::RateLimited if pauses < self.policy.max_rate_limit_pauses => {
                    pauses += 1;
                    let cooldown = self.policy.rate_limit_cooldown;
                    tracing::warn!("Rate limited on {}, cooling down for {:?}", url, cooldown);
                    self.reporter.update_log(
                        category::RATE_LIMIT,
                        &format!(
                            "Rate limit hit for {}. Sleeping for {}s...",
                            url,
                            cooldown.as_secs()
                        ),
                    );
                    self.sleeper.sleep(cooldown).await;
                    continue;
                }
                AttemptOutcome::RateLimited => "Rate limit persisted (HTTP 429)".to_string(),
                AttemptOutcome::Transient(reason) => reason,
                AttemptOutcome::Permanent(reason) => {
                    tracing::error!("Request failed for {}: {}", url, reason);
                    self.reporter.update_log(
                        category::REQUEST_FAILED,
                        &format!("Request failed for {}: {}", url, reason),
                    );
                    return None;
                }
            };

            attempt += 1;
            if attempt < max_attempts {
                let delay = backoff_delay(attempt - 1, rng);
                tracing::warn!(
                    "{} for {} (attempt {}/{}), retrying in {:.1}s",
                    reason,
                    url,
                    attempt,
                    max_attempts,
                    delay.as_secs_f64()
                );
                self.reporter.update_log(
                    category::RETRYING,
                    &format!(
                        "{} for {}. Retrying ({}/{})...",
                        reason, url, attempt, max_attempts
                    ),
                );
                self.sleeper.sleep(delay).await;
            } else {
                tracing::warn!("{} for {} (attempt {}/{})", reason, url, attempt, max_attempts);
            }
        }

        tracing::error!("Max retries reached for {}", url);
        self.reporter.update_log(
            category::FETCH_FAILED,
            &format!("Max retries reached. Could not fetch {}.", url),
        );
        None
    }

    async fn attempt(&self, url: &str, headers: &HeaderMap) -> AttemptOutcome {
        match self.client.get(url).headers(headers.clone()).send().await {
            Ok(response) => AttemptOutcome::from_response(response),
            Err(error) => AttemptOutcome::from_error(&error),
        }
    }
}
