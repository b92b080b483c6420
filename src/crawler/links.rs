//! Picture page link extraction and reload URL rewriting
//!
//! Both operations are pure: no I/O, no shared state.

use super::document::Element;
use url::Url;

/// Path segment that marks an anchor as a picture page link
pub const PICTURE_PAGE_MARKER: &str = "/s/";

/// Query parameter carrying the reload token
pub const RELOAD_PARAM: &str = "nl";

/// Extracts picture page URLs from anchor elements
///
/// Keeps the href of every anchor that contains [`PICTURE_PAGE_MARKER`], in
/// input order. Anchors without an href or without the marker are dropped.
pub fn extract_picture_pages(anchors: &[Element]) -> Vec<String> {
    anchors
        .iter()
        .filter_map(|anchor| anchor.attr("href"))
        .filter(|href| href.contains(PICTURE_PAGE_MARKER))
        .map(str::to_string)
        .collect()
}

/// Rewrites a picture page URL so its `nl` query parameter equals `nl_value`
///
/// An existing `nl` keeps its position and gets the new value; duplicates are
/// dropped. Without one, `nl` is appended. Every other parameter, including
/// repeated keys, is kept in order, and the query is re-serialized with form
/// encoding. Scheme, host and path are untouched.
///
/// # Example
///
/// ```
/// use album_ripper::crawler::reload;
///
/// let url = reload("https://example.com/s/abc/1-2?nl=old", "1234-5678").unwrap();
/// assert_eq!(url, "https://example.com/s/abc/1-2?nl=1234-5678");
/// ```
pub fn reload(picture_page: &str, nl_value: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(picture_page)?;

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (key, value) in url.query_pairs() {
        if key == RELOAD_PARAM {
            if !replaced {
                pairs.push((RELOAD_PARAM.to_string(), nl_value.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }
    if !replaced {
        pairs.push((RELOAD_PARAM.to_string(), nl_value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(pairs);
    Ok(url.to_string())
}
