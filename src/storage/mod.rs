//! Storage sink for downloaded albums
//!
//! This module handles everything the downloader writes locally:
//! - Album directory creation under the download root
//! - Filename derivation and sanitization for untrusted names
//! - Streaming image bodies to disk
//! - The session log of failed image URLs

mod sanitize;
mod session_log;
mod sink;

pub use sanitize::{
    image_filename, is_reserved_name, sanitize_directory_name, unique_filename, INVALID_CHARS,
};
pub use session_log::SessionLog;
pub use sink::{write_stream, SinkError};

use crate::{Result, RipperError};
use std::path::{Path, PathBuf};

/// Directory name used when an album name is unusable as a path component
const FALLBACK_DIRECTORY: &str = "album";

/// Creates `<root>/<sanitized album name>` if it does not exist yet
///
/// # Returns
///
/// * `Ok(PathBuf)` - The album directory
/// * `Err(RipperError::CreateDirectory)` - The directory could not be created
pub fn create_download_directory(root: &Path, album_name: &str) -> Result<PathBuf> {
    let mut name = sanitize_directory_name(album_name);
    if is_reserved_name(&name) {
        name = FALLBACK_DIRECTORY.to_string();
    }

    let path = root.join(name);
    std::fs::create_dir_all(&path).map_err(|source| {
        tracing::error!("Error creating directory {}: {}", path.display(), source);
        RipperError::CreateDirectory {
            path: path.clone(),
            source,
        }
    })?;

    Ok(path)
}
