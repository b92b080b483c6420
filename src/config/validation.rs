use crate::config::types::{Config, HttpConfig, PacingConfig, PathsConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Longest pause a pacing range may ask for, one hour
pub const MAX_PAUSE_SECS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_paths_config(&config.paths)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_pacing_config(&config.pacing)?;
    Ok(())
}

fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    for (key, value) in [
        ("download-root", &config.download_root),
        ("urls-file", &config.urls_file),
        ("session-log", &config.session_log),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", key)));
        }
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.download_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "download-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.chunk_size == 0 {
        return Err(ConfigError::Validation(
            "chunk-size must be >= 1".to_string(),
        ));
    }

    let referer = Url::parse(&config.referer)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid referer: {}", e)))?;

    if referer.scheme() != "http" && referer.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Referer '{}' must use http or https",
            config.referer
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_range(
        "page-pause",
        config.page_pause_min_secs,
        config.page_pause_max_secs,
    )?;
    validate_range(
        "image-pause",
        config.image_pause_min_secs,
        config.image_pause_max_secs,
    )
}

/// A pause range must be finite, non-negative, bounded and ordered
fn validate_range(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} bounds must be finite and non-negative, got {}..{}",
            name, min, max
        )));
    }

    if max > MAX_PAUSE_SECS {
        return Err(ConfigError::Validation(format!(
            "{}-max-secs ({}) must not exceed {}",
            name, max, MAX_PAUSE_SECS
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{}-min-secs ({}) must not exceed {}-max-secs ({})",
            name, min, name, max
        )));
    }

    Ok(())
}
