//! Configuration module for Album-Ripper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use album_ripper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripper.toml")).unwrap();
//! println!("Images go to: {}", config.paths.download_root);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, PacingConfig, PathsConfig, RetryConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
