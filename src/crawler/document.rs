//! Parsed page documents and the element queries run against them
//!
//! Callers never see the underlying HTML tree. They describe what they want
//! with an [`ElementQuery`] (a tag name plus attribute predicates) and get
//! back owned [`Element`] values.

use crate::{Result, RipperError};
use scraper::{Html, Selector};
use url::Url;

/// Attribute predicate of an element query
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeMatch {
    /// The attribute must be present, with any value
    Present(String),

    /// The attribute must be present with exactly this value
    Equals(String, String),
}

/// Finds elements by tag name and attribute predicates
///
/// # Example
///
/// ```
/// use album_ripper::crawler::ElementQuery;
///
/// let image = ElementQuery::tag("img").with_attr_eq("id", "img").with_attr("src");
/// assert_eq!(image.to_css(), r#"img[id="img"][src]"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    tag: String,
    attributes: Vec<AttributeMatch>,
}

impl ElementQuery {
    /// Matches every element with the given tag name
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Additionally requires the attribute to be present
    pub fn with_attr(mut self, name: &str) -> Self {
        self.attributes
            .push(AttributeMatch::Present(name.to_string()));
        self
    }

    /// Additionally requires the attribute to equal `value`
    pub fn with_attr_eq(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .push(AttributeMatch::Equals(name.to_string(), value.to_string()));
        self
    }

    /// Renders the query as a CSS selector
    pub fn to_css(&self) -> String {
        let mut css = self.tag.clone();
        for attribute in &self.attributes {
            match attribute {
                AttributeMatch::Present(name) => {
                    css.push('[');
                    css.push_str(name);
                    css.push(']');
                }
                AttributeMatch::Equals(name, value) => {
                    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                    css.push_str(&format!("[{}=\"{}\"]", name, escaped));
                }
            }
        }
        css
    }

    fn selector(&self) -> Result<Selector> {
        let css = self.to_css();
        Selector::parse(&css).map_err(|e| RipperError::Selector(format!("{}: {:?}", css, e)))
    }
}

/// An element matched by an [`ElementQuery`], detached from its document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name
    pub name: String,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    /// Concatenated, trimmed text content
    pub text: String,
}

impl Element {
    /// Returns the value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A fetched HTML page together with the URL it was fetched from
///
/// The document keeps its source text and parses it per query, so it stays
/// `Send` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PageDocument {
    url: Url,
    source: String,
}

impl PageDocument {
    pub fn new(url: Url, source: String) -> Self {
        Self { url, source }
    }

    /// The URL this document was fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns every element matching the query, in document order
    pub fn find_all(&self, query: &ElementQuery) -> Result<Vec<Element>> {
        let selector = query.selector()?;
        let html = Html::parse_document(&self.source);

        Ok(html
            .select(&selector)
            .map(|element| {
                let value = element.value();
                Element {
                    name: value.name().to_string(),
                    attributes: value
                        .attrs()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect(),
                    text: element.text().collect::<String>().trim().to_string(),
                }
            })
            .collect())
    }

    /// Returns the first element matching the query
    pub fn find_first(&self, query: &ElementQuery) -> Result<Option<Element>> {
        Ok(self.find_all(query)?.into_iter().next())
    }

    /// Resolves an href found in this document to an absolute http(s) URL
    pub fn resolve(&self, href: &str) -> Option<Url> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }

        self.url
            .join(href)
            .ok()
            .filter(|url| url.scheme() == "http" || url.scheme() == "https")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(html: &str) -> PageDocument {
        PageDocument::new(
            Url::parse("https://example.com/g/1/abc/").unwrap(),
            html.to_string(),
        )
    }

    #[test]
    fn test_to_css() {
        assert_eq!(ElementQuery::tag("a").with_attr("href").to_css(), "a[href]");
        assert_eq!(
            ElementQuery::tag("h1").with_attr_eq("id", "gn").to_css(),
            r#"h1[id="gn"]"#
        );
        assert_eq!(
            ElementQuery::tag("a").with_attr_eq("title", "say \"hi\"").to_css(),
            r#"a[title="say \"hi\""]"#
        );
    }

    #[test]
    fn test_find_all_by_attribute_presence() {
        let doc = document(
            r#"<html><body>
                <a href="/one">One</a>
                <a name="anchor">No href</a>
                <a href="/two">Two</a>
            </body></html>"#,
        );

        let anchors = doc
            .find_all(&ElementQuery::tag("a").with_attr("href"))
            .unwrap();

        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].attr("href"), Some("/one"));
        assert_eq!(anchors[1].attr("href"), Some("/two"));
        assert_eq!(anchors[1].text, "Two");
    }

    #[test]
    fn test_find_first_by_attribute_equality() {
        let doc = document(
            r#"<html><body>
                <img id="thumb" src="/t.jpg">
                <img id="img" src="https://cdn.example.com/full.jpg">
            </body></html>"#,
        );

        let image = doc
            .find_first(&ElementQuery::tag("img").with_attr_eq("id", "img").with_attr("src"))
            .unwrap()
            .unwrap();

        assert_eq!(image.name, "img");
        assert_eq!(image.attr("src"), Some("https://cdn.example.com/full.jpg"));
    }

    #[test]
    fn test_find_first_missing() {
        let doc = document("<html><body><p>Nothing here</p></body></html>");
        let found = doc.find_first(&ElementQuery::tag("img")).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_resolve() {
        let doc = document("");
        assert_eq!(
            doc.resolve("/s/aa/1-1").unwrap().as_str(),
            "https://example.com/s/aa/1-1"
        );
        assert_eq!(
            doc.resolve("?p=1").unwrap().as_str(),
            "https://example.com/g/1/abc/?p=1"
        );
        assert!(doc.resolve("#top").is_none());
        assert!(doc.resolve("javascript:void(0)").is_none());
        assert!(doc.resolve("   ").is_none());
    }
}
