use crate::client::build_client;
use crate::content::{TargetDomainSet, count_internal_links};
use crate::error::Result;
use crate::result::PageAnalysis;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};
use url::Url;

/// Reports crawl progress as (pages completed, total pages).
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on the worker pool; more outbound pressure than this tends to
/// trip rate limiting on the target host.
pub const MAX_WORKERS: usize = 20;

/// Fans page analysis out over a bounded worker pool.
pub struct Analyzer {
    client: Client,
    targets: TargetDomainSet,
    workers: usize,
    delay: Option<Duration>,
    progress_callback: Option<ProgressCallback>,
}

impl Analyzer {
    pub fn new(targets: TargetDomainSet) -> Self {
        Self::with_timeout(targets, 10)
    }

    pub fn with_timeout(targets: TargetDomainSet, timeout_secs: u64) -> Self {
        Self {
            client: build_client(Duration::from_secs(timeout_secs)),
            targets,
            workers: DEFAULT_WORKERS,
            delay: None,
            progress_callback: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    /// Fixed pause before each page fetch, for hosts that dislike bursts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Analyze every URL through the worker pool. Results accumulate in
    /// completion order; a page that fails to fetch is recorded with a zero
    /// count rather than aborting the batch.
    pub async fn analyze(&self, urls: Vec<String>) -> Result<Vec<PageAnalysis>> {
        let total = urls.len();
        info!("analyzing {} pages with {} workers", total, self.workers);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let results: Arc<Mutex<Vec<PageAnalysis>>> =
            Arc::new(Mutex::new(Vec::with_capacity(total)));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(total);
        for url in urls {
            let client = self.client.clone();
            let targets = self.targets.clone();
            let semaphore = semaphore.clone();
            let results = results.clone();
            let completed = completed.clone();
            let progress = self.progress_callback.clone();
            let delay = self.delay;

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }

                let analysis = analyze_page(&client, &url, &targets).await;
                results.lock().await.push(analysis);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(callback) = progress {
                    callback(done, total);
                }
            }));
        }

        for handle in futures::future::join_all(handles).await {
            handle?;
        }

        let results = results.lock().await.clone();
        info!("analysis complete, {} pages", results.len());
        Ok(results)
    }
}

/// Analyze one page, absorbing every failure into a zero-count record.
async fn analyze_page(client: &Client, url: &str, targets: &TargetDomainSet) -> PageAnalysis {
    let category = category_for(url);
    let page_url = match Url::parse(url) {
        Ok(page_url) => page_url,
        Err(e) => {
            warn!("unparseable page URL {}: {}", url, e);
            return PageAnalysis::failed(url.to_string(), category, e.to_string());
        }
    };

    match count_internal_links(client, &page_url, targets).await {
        Ok(count) => PageAnalysis::new(url.to_string(), count, category),
        Err(e) => {
            warn!("analysis failed for {}: {}", url, e);
            PageAnalysis::failed(url.to_string(), category, e.to_string())
        }
    }
}

/// First non-empty path segment of a URL, or "root" for the site root.
pub fn category_for(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.find(|s| !s.is_empty()))
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_page(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn article_with_links(base: &str, hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|h| format!(r#"<a href="{}{}">link</a>"#, base, h))
            .collect();
        format!("<html><body><article>{}</article></body></html>", anchors)
    }

    // ========================================================================
    // category_for
    // ========================================================================

    #[test]
    fn category_is_first_path_segment() {
        assert_eq!(category_for("https://x.test/blog/post-1"), "blog");
        assert_eq!(category_for("https://x.test/docs"), "docs");
    }

    #[test]
    fn root_page_gets_root_category() {
        assert_eq!(category_for("https://x.test/"), "root");
        assert_eq!(category_for("https://x.test"), "root");
    }

    #[test]
    fn empty_leading_segments_are_skipped() {
        assert_eq!(category_for("https://x.test//double/slash"), "double");
    }

    #[test]
    fn unparseable_url_gets_root_category() {
        assert_eq!(category_for("not a url"), "root");
    }

    // ========================================================================
    // Analyzer
    // ========================================================================

    #[tokio::test]
    async fn analyzes_every_page_in_the_batch() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_page(&server, "/", article_with_links(&base, &["/a", "/b"])).await;
        mount_page(&server, "/blog/one", article_with_links(&base, &["/a"])).await;
        mount_page(&server, "/blog/two", article_with_links(&base, &[])).await;

        let site = Url::parse(&base).unwrap();
        let targets = TargetDomainSet::from_site(&site, &[]);
        let analyzer = Analyzer::new(targets).with_workers(2);

        let urls = vec![
            format!("{}/", base),
            format!("{}/blog/one", base),
            format!("{}/blog/two", base),
        ];
        let mut results = analyzer.analyze(urls).await.unwrap();
        assert_eq!(results.len(), 3);

        results.sort_by(|a, b| a.url.cmp(&b.url));
        let by_url: Vec<(usize, &str)> = results
            .iter()
            .map(|r| (r.internal_links, r.category.as_str()))
            .collect();
        assert_eq!(by_url, vec![(2, "root"), (1, "blog"), (0, "blog")]);
    }

    #[tokio::test]
    async fn failed_page_is_recorded_as_zero_without_aborting() {
        let server = MockServer::start().await;
        let base = server.uri();

        mount_page(&server, "/ok", article_with_links(&base, &["/a"])).await;
        // /missing is never mounted -> 404 -> zero count, no error
        let urls = vec![
            format!("{}/ok", base),
            format!("{}/missing", base),
            "not a url at all".to_string(),
        ];

        let site = Url::parse(&base).unwrap();
        let targets = TargetDomainSet::from_site(&site, &[]);
        let analyzer = Analyzer::new(targets).with_workers(4);

        let results = analyzer.analyze(urls).await.unwrap();
        assert_eq!(results.len(), 3);

        let ok = results.iter().find(|r| r.url.ends_with("/ok")).unwrap();
        assert_eq!(ok.internal_links, 1);
        assert!(ok.error.is_none());

        let missing = results.iter().find(|r| r.url.ends_with("/missing")).unwrap();
        assert_eq!(missing.internal_links, 0);

        let invalid = results.iter().find(|r| r.url == "not a url at all").unwrap();
        assert_eq!(invalid.internal_links, 0);
        assert!(invalid.error.is_some());
    }

    #[tokio::test]
    async fn progress_callback_reaches_total() {
        let server = MockServer::start().await;
        let base = server.uri();
        for p in ["/p1", "/p2", "/p3", "/p4"] {
            mount_page(&server, p, article_with_links(&base, &[])).await;
        }

        let seen: Arc<StdMutex<Vec<(usize, usize)>>> = Arc::new(StdMutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let site = Url::parse(&base).unwrap();
        let targets = TargetDomainSet::from_site(&site, &[]);
        let analyzer = Analyzer::new(targets)
            .with_workers(2)
            .with_progress_callback(Arc::new(move |done: usize, total: usize| {
                seen_clone.lock().unwrap().push((done, total));
            }));

        let urls: Vec<String> = ["/p1", "/p2", "/p3", "/p4"]
            .iter()
            .map(|p| format!("{}{}", base, p))
            .collect();
        analyzer.analyze(urls).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|(_, total)| *total == 4));
        assert!(seen.iter().any(|(done, _)| *done == 4));
    }

    #[tokio::test]
    async fn empty_batch_completes_immediately() {
        let site = Url::parse("https://example.com/").unwrap();
        let targets = TargetDomainSet::from_site(&site, &[]);
        let analyzer = Analyzer::new(targets);

        let results = analyzer.analyze(Vec::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn worker_count_is_clamped() {
        let site = Url::parse("https://example.com/").unwrap();
        let targets = TargetDomainSet::from_site(&site, &[]);
        let analyzer = Analyzer::new(targets.clone()).with_workers(500);
        assert_eq!(analyzer.workers, MAX_WORKERS);

        let analyzer = Analyzer::new(targets).with_workers(0);
        assert_eq!(analyzer.workers, 1);
    }
}
