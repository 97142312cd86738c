use crate::error::Result;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Tags whose subtrees are site chrome rather than editorial content.
const EXCLUDED_CHROME: &str = "nav, header, footer, aside, form, script, style";

/// Content-region candidates, most specific first.
const CONTENT_REGIONS: &[&str] = &["article", "main", "body"];

/// Domains treated as "internal" when counting cross-links. Hosts are
/// normalized to lower case with a single leading `www.` stripped, so
/// `www.Example.com`, `example.com` and `EXAMPLE.COM` all compare equal.
#[derive(Debug, Clone, Default)]
pub struct TargetDomainSet {
    domains: HashSet<String>,
}

impl TargetDomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The site's own host plus any related domains the caller supplied.
    pub fn from_site(site_url: &Url, related: &[String]) -> Self {
        let mut set = Self::new();
        if let Some(host) = site_url.host_str() {
            set.insert(host);
        }
        for domain in related {
            if !domain.trim().is_empty() {
                set.insert(domain);
            }
        }
        set
    }

    pub fn insert(&mut self, domain: &str) {
        self.domains.insert(Self::normalize(domain));
    }

    pub fn contains(&self, host: &str) -> bool {
        self.domains.contains(&Self::normalize(host))
    }

    pub fn normalize(domain: &str) -> String {
        let lowered = domain.trim().to_ascii_lowercase();
        lowered.strip_prefix("www.").unwrap_or(&lowered).to_string()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.domains.iter().map(String::as_str)
    }
}

/// Fetch a page and count its distinct in-content internal links. A non-200
/// response counts as zero; transport errors surface so the caller can tell
/// "no links" from "fetch failed" (it still records them as zero).
pub async fn count_internal_links(
    client: &Client,
    page_url: &Url,
    targets: &TargetDomainSet,
) -> Result<usize> {
    let response = client.get(page_url.clone()).send().await?;
    if response.status() != StatusCode::OK {
        debug!("{} responded {}", page_url, response.status());
        return Ok(0);
    }
    let body = response.text().await?;
    Ok(count_links_in_html(&body, page_url, targets))
}

/// Count distinct internal links inside a page's main content region.
///
/// The region is the first match of `article`, `main`, `body`; chrome
/// subtrees (`nav`, `header`, `footer`, `aside`, `form`, `script`, `style`)
/// are detached from the parse tree before anchors are collected, so a link
/// under a nested excluded element is never counted. Hrefs are resolved
/// against the page URL, fragments stripped, and a link back to the page
/// itself is not a cross-link. Duplicate targets count once.
pub fn count_links_in_html(html: &str, page_url: &Url, targets: &TargetDomainSet) -> usize {
    let mut document = Html::parse_document(html);

    let region_id = {
        let mut found = None;
        for tag in CONTENT_REGIONS {
            let selector = Selector::parse(tag).unwrap();
            if let Some(element) = document.select(&selector).next() {
                found = Some(element.id());
                break;
            }
        }
        match found {
            Some(id) => id,
            None => return 0,
        }
    };

    let chrome_selector = Selector::parse(EXCLUDED_CHROME).unwrap();
    let chrome_ids: Vec<_> = match document.tree.get(region_id).and_then(ElementRef::wrap) {
        Some(region) => region.select(&chrome_selector).map(|el| el.id()).collect(),
        None => return 0,
    };
    for id in chrome_ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    let region = match document.tree.get(region_id).and_then(ElementRef::wrap) {
        Some(region) => region,
        None => return 0,
    };

    let mut own_url = page_url.clone();
    own_url.set_fragment(None);

    let link_selector = Selector::parse("a[href]").unwrap();
    let mut distinct: HashSet<String> = HashSet::new();

    for anchor in region.select(&link_selector) {
        let href = match anchor.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let mut resolved = match page_url.join(href) {
            Ok(resolved) => resolved,
            Err(_) => continue,
        };
        resolved.set_fragment(None);

        let host = match resolved.host_str() {
            Some(host) => host,
            None => continue,
        };
        if !targets.contains(host) {
            continue;
        }
        // a link back to the page itself (same-page anchor) is not a cross-link
        if resolved == own_url {
            continue;
        }

        distinct.insert(resolved.to_string());
    }

    distinct.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(domains: &[&str]) -> TargetDomainSet {
        let mut set = TargetDomainSet::new();
        for domain in domains {
            set.insert(domain);
        }
        set
    }

    fn page() -> Url {
        Url::parse("https://example.com/blog/post-1").unwrap()
    }

    // ========================================================================
    // TargetDomainSet
    // ========================================================================

    #[test]
    fn normalization_lowercases_and_strips_www() {
        assert_eq!(TargetDomainSet::normalize("www.Example.com"), "example.com");
        assert_eq!(TargetDomainSet::normalize("EXAMPLE.COM"), "example.com");
        assert_eq!(TargetDomainSet::normalize("example.com"), "example.com");
    }

    #[test]
    fn normalization_strips_only_a_leading_www() {
        assert_eq!(TargetDomainSet::normalize("www.www.x.test"), "www.x.test");
        assert_eq!(TargetDomainSet::normalize("wwwx.test"), "wwwx.test");
    }

    #[test]
    fn membership_is_normalization_insensitive() {
        let set = targets(&["www.Example.com"]);
        assert!(set.contains("example.com"));
        assert!(set.contains("EXAMPLE.COM"));
        assert!(set.contains("www.example.com"));
        assert!(!set.contains("other.com"));
    }

    #[test]
    fn from_site_includes_own_host_and_related() {
        let site = Url::parse("https://www.example.com/").unwrap();
        let set = TargetDomainSet::from_site(
            &site,
            &["Sister-Brand.org".to_string(), "  ".to_string()],
        );
        assert_eq!(set.len(), 2);
        assert!(set.contains("example.com"));
        assert!(set.contains("sister-brand.org"));
    }

    // ========================================================================
    // Content region selection
    // ========================================================================

    #[test]
    fn article_is_preferred_over_body() {
        let html = r#"<html><body>
            <a href="/outside">outside</a>
            <article><a href="/inside">inside</a></article>
        </body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn main_is_used_when_no_article() {
        let html = r#"<html><body>
            <a href="/outside">outside</a>
            <main><a href="/inside">inside</a></main>
        </body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn body_is_the_last_resort() {
        let html = r#"<html><body>
            <a href="/one">one</a>
            <a href="/two">two</a>
        </body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 2);
    }

    // ========================================================================
    // Chrome exclusion
    // ========================================================================

    #[test]
    fn nav_nested_in_article_is_excluded() {
        let html = r#"<html><body><article>
            <nav><a href="/from-nav">nav link</a></nav>
            <a href="/from-content">content link</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn link_deep_inside_excluded_region_is_never_counted() {
        let html = r#"<html><body><article>
            <footer><div><p><a href="/buried">buried</a></p></div></footer>
            <a href="/kept">kept</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn all_chrome_tags_are_excluded() {
        let html = r#"<html><body>
            <nav><a href="/n">n</a></nav>
            <header><a href="/h">h</a></header>
            <footer><a href="/f">f</a></footer>
            <aside><a href="/a">a</a></aside>
            <form><a href="/fo">fo</a></form>
            <a href="/content">content</a>
        </body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    // ========================================================================
    // Link qualification
    // ========================================================================

    #[test]
    fn same_page_anchor_is_excluded() {
        let html = r##"<html><body><article>
            <a href="#section">toc</a>
            <a href="https://example.com/blog/post-1#heading">self with fragment</a>
            <a href="/about">real</a>
        </article></body></html>"##;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn duplicate_targets_count_once() {
        let html = r#"<html><body><article>
            <a href="/about">first</a>
            <a href="https://example.com/about">second</a>
            <a href="/about#team">third, fragment only</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn external_hosts_are_not_counted() {
        let html = r#"<html><body><article>
            <a href="https://elsewhere.net/page">external</a>
            <a href="/internal">internal</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn host_case_and_www_variants_match() {
        let html = r#"<html><body><article>
            <a href="https://WWW.EXAMPLE.COM/one">shouty www</a>
            <a href="https://example.com/two">plain</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 2);
    }

    #[test]
    fn related_domain_counts_as_internal() {
        let html = r#"<html><body><article>
            <a href="https://sister-brand.org/campus">related</a>
        </article></body></html>"#;
        let count = count_links_in_html(
            html,
            &page(),
            &targets(&["example.com", "sister-brand.org"]),
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn protocol_relative_href_is_resolved() {
        let html = r#"<html><body><article>
            <a href="//example.com/schemeless">protocol relative</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 1);
    }

    #[test]
    fn non_navigational_schemes_are_skipped() {
        let html = r#"<html><body><article>
            <a href="mailto:seo@example.com">mail</a>
            <a href="tel:+15551234567">phone</a>
            <a href="javascript:void(0)">js</a>
        </article></body></html>"#;
        let count = count_links_in_html(html, &page(), &targets(&["example.com"]));
        assert_eq!(count, 0);
    }

    #[test]
    fn counting_is_idempotent() {
        let html = r#"<html><body><article>
            <nav><a href="/nav">nav</a></nav>
            <a href="/a">a</a>
            <a href="/b">b</a>
        </article></body></html>"#;
        let set = targets(&["example.com"]);
        let first = count_links_in_html(html, &page(), &set);
        let second = count_links_in_html(html, &page(), &set);
        assert_eq!(first, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_document_counts_zero() {
        assert_eq!(count_links_in_html("", &page(), &targets(&["example.com"])), 0);
    }
}
