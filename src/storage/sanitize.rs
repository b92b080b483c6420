//! Name sanitization for directories and image files
//!
//! Album titles and URL segments come from the remote site and are untrusted.
//! Everything written to disk passes through here first.

use std::collections::HashSet;
use url::Url;

/// Characters rejected by at least one supported filesystem
pub const INVALID_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replacement for every invalid character
const REPLACEMENT: char = '_';

/// Replaces characters that are invalid in a directory name with `_`
///
/// The full Windows-invalid set and ASCII control characters are replaced on
/// every platform. A name without such characters is returned unchanged.
///
/// # Examples
///
/// ```
/// use album_ripper::storage::sanitize_directory_name;
///
/// assert_eq!(sanitize_directory_name("Vol. 1: Spring/Summer"), "Vol. 1_ Spring_Summer");
/// assert_eq!(sanitize_directory_name("plain name"), "plain name");
/// ```
pub fn sanitize_directory_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_ascii_control() {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect()
}

/// Returns true for names that would escape or alias their parent directory
pub fn is_reserved_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed == "." || trimmed == ".."
}

/// Derives a filename from the final path segment of an image URL
///
/// The segment is sanitized like a directory name. Empty, `.` and `..`
/// segments are replaced by `fallback`.
pub fn image_filename(image_url: &Url, fallback: &str) -> String {
    let segment = image_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let name = sanitize_directory_name(segment);
    if is_reserved_name(&name) {
        fallback.to_string()
    } else {
        name
    }
}

/// Makes `name` unique among `used`, then records it
///
/// Collisions get `-1`, `-2`, ... inserted before the extension.
pub fn unique_filename(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, extension) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };

    let mut counter = 1;
    loop {
        let candidate = format!("{}-{}{}", stem, counter, extension);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}
