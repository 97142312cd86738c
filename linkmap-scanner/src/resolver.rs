use crate::client::build_client;
use crate::error::{Result, ScanError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Conventional sitemap locations, probed in order when robots.txt declares
/// nothing.
pub const SITEMAP_PROBE_PATHS: &[&str] =
    &["/sitemap.xml", "/sitemap_index.xml", "/wp-sitemap.xml"];

/// Locates a site's sitemap: robots.txt `Sitemap:` directive first, then the
/// conventional paths.
pub struct SitemapResolver {
    client: Client,
    fallback_guess: bool,
}

impl SitemapResolver {
    pub fn new() -> Self {
        Self::with_timeout(5)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            client: build_client(Duration::from_secs(timeout_secs)),
            fallback_guess: false,
        }
    }

    /// When set, an unverified `{root}/sitemap.xml` guess is returned after
    /// every check has failed, instead of `SitemapNotFound`.
    pub fn with_fallback_guess(mut self, fallback_guess: bool) -> Self {
        self.fallback_guess = fallback_guess;
        self
    }

    pub async fn resolve(&self, base_url: &Url) -> Result<Url> {
        let root = site_root(base_url)?;

        if let Some(declared) = self.from_robots_txt(&root).await {
            debug!("robots.txt declares sitemap {}", declared);
            return Ok(declared);
        }

        for probe_path in SITEMAP_PROBE_PATHS {
            let candidate = root
                .join(probe_path)
                .map_err(|e| ScanError::InvalidUrl(format!("{}{}: {}", root, probe_path, e)))?;
            if self.probe(&candidate).await {
                debug!("probe hit {}", candidate);
                return Ok(candidate);
            }
        }

        if self.fallback_guess {
            let guess = root
                .join("/sitemap.xml")
                .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", root, e)))?;
            debug!("all checks failed, guessing {}", guess);
            return Ok(guess);
        }

        Err(ScanError::SitemapNotFound(root.to_string()))
    }

    async fn from_robots_txt(&self, root: &Url) -> Option<Url> {
        let robots_url = root.join("/robots.txt").ok()?;
        let response = self.client.get(robots_url).send().await.ok()?;
        if response.status() != StatusCode::OK {
            return None;
        }
        let body = response.text().await.ok()?;
        let declared = first_sitemap_directive(&body)?;
        // directives are usually absolute; resolve relative ones against the root
        Url::parse(&declared).or_else(|_| root.join(&declared)).ok()
    }

    /// Existence check without downloading a body.
    async fn probe(&self, candidate: &Url) -> bool {
        match self.client.head(candidate.clone()).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }
}

impl Default for SitemapResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheme+host root of a URL, with path, query and fragment dropped.
fn site_root(base_url: &Url) -> Result<Url> {
    if base_url.host_str().is_none() {
        return Err(ScanError::InvalidUrl(base_url.to_string()));
    }
    let mut root = base_url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    Ok(root)
}

/// First `Sitemap:` directive in a robots.txt body, matched
/// case-insensitively, value trimmed of surrounding whitespace.
pub fn first_sitemap_directive(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if line.to_ascii_lowercase().starts_with("sitemap:") {
            let value = line["sitemap:".len()..].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
