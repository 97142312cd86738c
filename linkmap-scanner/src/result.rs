use serde::{Deserialize, Serialize};

/// Outcome of analyzing a single page from the sitemap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub url: String,
    pub internal_links: usize,
    /// First non-empty path segment of the URL, or "root".
    pub category: String,
    /// Set when the page could not be fetched; the count is then 0, which
    /// lets a caller tell "no links found" from "fetch failed".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageAnalysis {
    pub fn new(url: String, internal_links: usize, category: String) -> Self {
        Self {
            url,
            internal_links,
            category,
            error: None,
        }
    }

    pub fn failed(url: String, category: String, error: String) -> Self {
        Self {
            url,
            internal_links: 0,
            category,
            error: Some(error),
        }
    }
}
