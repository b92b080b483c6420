//! Crawler module for album discovery
//!
//! This module contains everything needed to go from an album URL to the
//! links that serve full-resolution image pages:
//! - Page fetching and the narrow element query interface
//! - Picture page extraction and reload URL rewriting
//! - Album name and pagination discovery

mod album;
mod document;
mod fetcher;
mod links;

pub use album::{extract_reload_token, page_index, Crawler};
pub use document::{Element, ElementQuery, PageDocument};
pub use fetcher::{build_page_client, PageFetcher};
pub use links::{extract_picture_pages, reload, PICTURE_PAGE_MARKER, RELOAD_PARAM};
