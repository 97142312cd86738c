use crate::client::build_client;
use crate::error::{Result, ScanError};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// A parsed sitemap document: either a leaf `<urlset>` listing page URLs or
/// a `<sitemapindex>` pointing at further sitemap documents. Decided by the
/// root element name; entry order is document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    UrlSet(Vec<String>),
    Index(Vec<String>),
}

/// Parse a sitemap XML document. `<loc>` values are collected only when they
/// sit directly inside a `<url>` or `<sitemap>` entry, so extension elements
/// like `<image:loc>` never leak in. Entries without a `<loc>` are skipped
/// without disturbing the order of the rest.
pub fn parse_sitemap(xml: &[u8]) -> Result<SitemapDocument> {
    let mut reader = Reader::from_reader(xml);

    let mut buf = Vec::new();
    let mut is_index: Option<bool> = None;
    let mut in_entry = false;
    let mut in_loc = false;
    let mut locs: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match (is_index, e.name().as_ref()) {
                (None, b"urlset") => is_index = Some(false),
                (None, b"sitemapindex") => is_index = Some(true),
                (None, other) => {
                    return Err(ScanError::Xml(format!(
                        "unexpected root element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
                (Some(_), b"url" | b"sitemap") => in_entry = true,
                (Some(_), b"loc") if in_entry => in_loc = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"loc" => in_loc = false,
                b"url" | b"sitemap" => in_entry = false,
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => {
                let text = t.unescape().map_err(|e| ScanError::Xml(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    locs.push(text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ScanError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(locs)),
        Some(false) => Ok(SitemapDocument::UrlSet(locs)),
        None => Err(ScanError::Xml("document has no root element".to_string())),
    }
}

/// Fetches sitemap documents and flattens index trees into a page URL list.
pub struct SitemapFetcher {
    client: Client,
}

impl SitemapFetcher {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            client: build_client(Duration::from_secs(timeout_secs)),
        }
    }

    /// Flatten a sitemap (or an arbitrarily nested sitemap-index tree) into
    /// its page URLs, preserving document order. A fetch or parse failure
    /// makes that branch contribute nothing; siblings are unaffected.
    /// Duplicate URLs across merged sub-sitemaps are kept as-is.
    pub async fn extract_links(&self, sitemap_url: &str) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut pending: Vec<String> = vec![sitemap_url.to_string()];
        let mut links: Vec<String> = Vec::new();

        while let Some(url) = pending.pop() {
            if !visited.insert(url.clone()) {
                warn!("sitemap {} already expanded, skipping cycle", url);
                continue;
            }

            let body = match self.fetch(&url).await {
                Ok(Some(body)) => body,
                Ok(None) => continue,
                Err(e) => {
                    warn!("failed to fetch sitemap {}: {}", url, e);
                    continue;
                }
            };

            match parse_sitemap(&body) {
                Ok(SitemapDocument::UrlSet(page_urls)) => {
                    debug!("sitemap {} lists {} pages", url, page_urls.len());
                    links.extend(page_urls);
                }
                Ok(SitemapDocument::Index(children)) => {
                    debug!("sitemap index {} has {} children", url, children.len());
                    // depth-first so the flattened list keeps document order
                    for child in children.into_iter().rev() {
                        pending.push(child);
                    }
                }
                Err(e) => warn!("failed to parse sitemap {}: {}", url, e),
            }
        }

        links
    }

    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            warn!("sitemap {} responded {}", url, response.status());
            return Ok(None);
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }
}

impl Default for SitemapFetcher {
    fn default() -> Self {
        Self::new()
    }
}
