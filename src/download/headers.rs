//! Per-request browser-like headers for image downloads
//!
//! Each image request carries a header set scoped to its host with a user
//! agent drawn from a fixed pool. The factory holds no mutable state; the
//! caller supplies the random source.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
    HOST, REFERER, USER_AGENT,
};
use url::Url;

/// User agent for page fetches and for an empty rotation pool
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0";

/// Rotation pool of desktop Firefox user agents
pub const FIREFOX_USER_AGENTS: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:131.0) Gecko/20100101 Firefox/131.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
];

const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/png,image/svg+xml,image/*;q=0.8,*/*;q=0.5";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";
const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";

/// Builds randomized, host-scoped header sets
#[derive(Debug, Clone)]
pub struct HeaderFactory {
    user_agents: Vec<String>,
    referer: String,
}

impl HeaderFactory {
    /// Creates a factory using the built-in Firefox pool
    pub fn new(referer: &str) -> Self {
        Self::with_user_agents(
            referer,
            FIREFOX_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        )
    }

    pub fn with_user_agents(referer: &str, user_agents: Vec<String>) -> Self {
        Self {
            user_agents,
            referer: referer.to_string(),
        }
    }

    /// Picks a user agent from the pool
    pub fn user_agent<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.user_agents
            .choose(rng)
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Builds the header set for a request to `target`
    pub fn headers<R: Rng + ?Sized>(&self, target: &Url, rng: &mut R) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(host) = host_header(target) {
            insert(&mut headers, HOST, &host);
        }
        insert(&mut headers, USER_AGENT, self.user_agent(rng));
        insert(&mut headers, ACCEPT, IMAGE_ACCEPT);
        insert(&mut headers, ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE);
        insert(&mut headers, ACCEPT_ENCODING, ACCEPT_ENCODING_VALUE);
        insert(&mut headers, CONNECTION, "keep-alive");
        insert(&mut headers, REFERER, &self.referer);
        insert(&mut headers, HeaderName::from_static("sec-fetch-dest"), "image");
        insert(&mut headers, HeaderName::from_static("sec-fetch-mode"), "no-cors");
        insert(&mut headers, HeaderName::from_static("sec-fetch-site"), "cross-site");

        headers
    }
}

/// Value of the `Host` header for `url`: host, plus the port when explicit
pub fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!("Skipping invalid {} header value: {:?}", name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn target() -> Url {
        Url::parse("https://cdn.example.com/h/abc/001.jpg").unwrap()
    }

    #[test]
    fn test_headers_are_host_scoped() {
        let factory = HeaderFactory::new("https://e-hentai.org/");
        let headers = factory.headers(&target(), &mut StdRng::seed_from_u64(1));

        assert_eq!(headers[HOST], "cdn.example.com");
        assert_eq!(headers[REFERER], "https://e-hentai.org/");
        assert_eq!(headers[ACCEPT], IMAGE_ACCEPT);
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert_eq!(headers["sec-fetch-dest"], "image");
        assert_eq!(headers["sec-fetch-mode"], "no-cors");
        assert_eq!(headers["sec-fetch-site"], "cross-site");
    }

    #[test]
    fn test_user_agent_comes_from_pool() {
        let factory = HeaderFactory::new("https://e-hentai.org/");
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let headers = factory.headers(&target(), &mut rng);
            let ua = headers[USER_AGENT].to_str().unwrap();
            assert!(FIREFOX_USER_AGENTS.contains(&ua));
        }
    }

    #[test]
    fn test_user_agent_rotates() {
        let factory = HeaderFactory::new("https://e-hentai.org/");
        let mut rng = StdRng::seed_from_u64(42);

        let seen: HashSet<String> = (0..50)
            .map(|_| factory.user_agent(&mut rng).to_string())
            .collect();
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_same_seed_same_headers() {
        let factory = HeaderFactory::new("https://e-hentai.org/");
        let a = factory.headers(&target(), &mut StdRng::seed_from_u64(3));
        let b = factory.headers(&target(), &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_pool_uses_default() {
        let factory = HeaderFactory::with_user_agents("https://e-hentai.org/", vec![]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(factory.user_agent(&mut rng), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/x.jpg").unwrap();
        assert_eq!(host_header(&url), Some("127.0.0.1:8080".to_string()));
        assert_eq!(host_header(&target()), Some("cdn.example.com".to_string()));
    }
}
