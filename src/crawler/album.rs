//! Album discovery: name, pagination and reload links
//!
//! The crawler starts from the already-fetched root page of an album. Album
//! pages are the root plus every page reachable through pagination links,
//! i.e. links to the same host and path carrying a numeric `p` parameter.

use super::document::{ElementQuery, PageDocument};
use super::fetcher::PageFetcher;
use super::links::reload;
use crate::progress::{category, ProgressReporter};
use crate::storage::sanitize_directory_name;
use crate::{Result, RipperError};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};
use url::Url;

/// Query parameter holding the zero-based pagination index
const PAGE_PARAM: &str = "p";

/// Fallback when no title can be derived at all
const FALLBACK_ALBUM_NAME: &str = "album";

/// Matches the token in a reload control script such as `return nl('1234-5678')`
#[allow(clippy::expect_used)]
static RELOAD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"nl\(\s*['"]([^'"]+)['"]\s*\)"#).expect("reload token regex is valid")
});

/// Walks one album, starting from its root document
pub struct Crawler {
    root: PageDocument,
    fetcher: PageFetcher,
    reporter: Arc<dyn ProgressReporter>,
}

impl Crawler {
    pub fn new(
        root: PageDocument,
        fetcher: PageFetcher,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            root,
            fetcher,
            reporter,
        }
    }

    /// The URL of the album root page
    pub fn album_url(&self) -> &Url {
        self.root.url()
    }

    /// Derives a filesystem-safe album name from the root document
    ///
    /// Tries the main title heading, then the alternate title heading, then
    /// `<title>`, then the last path segment of the album URL.
    pub fn album_name(&self) -> Result<String> {
        let candidates = [
            ElementQuery::tag("h1").with_attr_eq("id", "gn"),
            ElementQuery::tag("h1").with_attr_eq("id", "gj"),
            ElementQuery::tag("title"),
        ];

        for query in &candidates {
            if let Some(element) = self.root.find_first(query)? {
                if !element.text.is_empty() {
                    return Ok(sanitize_directory_name(&element.text));
                }
            }
        }

        let segment = self
            .root
            .url()
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or(FALLBACK_ALBUM_NAME);

        Ok(sanitize_directory_name(segment))
    }

    /// Collects every album page in pagination order
    ///
    /// The root keeps its own index, so an album URL that already carries a
    /// `p` parameter still yields page 0 first. Each pagination index is
    /// fetched at most once, so self-referencing or cyclic pagination
    /// terminates. Pages fetched along the way may reveal indices the root
    /// paginator elided.
    pub async fn collect_album_pages(&self) -> Result<Vec<PageDocument>> {
        let mut pages: BTreeMap<usize, PageDocument> = BTreeMap::new();
        let mut pending: BTreeMap<usize, Url> = BTreeMap::new();
        let mut seen: BTreeSet<usize> = BTreeSet::new();

        let root_index = page_index(self.album_url(), self.album_url()).unwrap_or(0);
        seen.insert(root_index);
        self.queue_pagination(&self.root, &mut seen, &mut pending)?;
        pages.insert(root_index, self.root.clone());

        while let Some((index, url)) = pending.pop_first() {
            tracing::debug!("Fetching album page {} ({})", index + 1, url);
            let document = self.fetcher.fetch(url.as_str()).await?;
            self.queue_pagination(&document, &mut seen, &mut pending)?;
            pages.insert(index, document);
        }

        self.reporter.update_log(
            category::ALBUM_PAGES,
            &format!("Found {} page(s) for {}", pages.len(), self.album_url()),
        );

        Ok(pages.into_values().collect())
    }

    /// Resolves each picture page to its reloaded link
    ///
    /// Every picture page is fetched; its reload control must carry a token.
    /// A page without one is not a picture page of the expected layout and
    /// the error is fatal.
    pub async fn get_reloaded_pages(&self, picture_pages: &[String]) -> Result<Vec<String>> {
        let mut reloaded = Vec::with_capacity(picture_pages.len());

        for picture_page in picture_pages {
            let document = self.fetcher.fetch(picture_page).await?;
            let token = find_reload_token(&document)?.ok_or_else(|| RipperError::Layout {
                url: picture_page.clone(),
                message: "reload control not found".to_string(),
            })?;

            let link = reload(document.url().as_str(), &token)?;
            tracing::debug!("Reloaded {} -> {}", picture_page, link);
            reloaded.push(link);
        }

        Ok(reloaded)
    }

    /// Queues pagination links of `document` whose index was never seen
    fn queue_pagination(
        &self,
        document: &PageDocument,
        seen: &mut BTreeSet<usize>,
        pending: &mut BTreeMap<usize, Url>,
    ) -> Result<()> {
        let anchors = document.find_all(&ElementQuery::tag("a").with_attr("href"))?;

        for anchor in anchors {
            let Some(url) = anchor.attr("href").and_then(|href| document.resolve(href)) else {
                continue;
            };
            let Some(index) = page_index(self.album_url(), &url) else {
                continue;
            };
            if seen.insert(index) {
                pending.insert(index, url);
            }
        }

        Ok(())
    }
}

/// Returns the pagination index of `candidate` within the album at `album`
///
/// A link to the album path without a `p` parameter is page 0. Links to
/// other hosts or paths, or with a non-numeric `p`, are not album pages.
pub fn page_index(album: &Url, candidate: &Url) -> Option<usize> {
    if candidate.host_str() != album.host_str()
        || candidate.port_or_known_default() != album.port_or_known_default()
        || candidate.path().trim_end_matches('/') != album.path().trim_end_matches('/')
    {
        return None;
    }

    match candidate
        .query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
    {
        Some((_, value)) => value.parse().ok(),
        None => Some(0),
    }
}

/// Finds the reload token in a picture page's reload control
fn find_reload_token(document: &PageDocument) -> Result<Option<String>> {
    let control = document.find_first(
        &ElementQuery::tag("a")
            .with_attr_eq("id", "loadfail")
            .with_attr("onclick"),
    )?;

    Ok(control
        .and_then(|element| element.attr("onclick").and_then(extract_reload_token)))
}

/// Extracts the token argument from a reload control script
pub fn extract_reload_token(script: &str) -> Option<String> {
    RELOAD_TOKEN
        .captures(script)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}
