use indicatif::{ProgressBar, ProgressStyle};
use linkmap_scanner::analyzer::{Analyzer, DEFAULT_WORKERS};
use linkmap_scanner::content::TargetDomainSet;
use linkmap_scanner::resolver::SitemapResolver;
use linkmap_scanner::result::PageAnalysis;
use linkmap_scanner::sitemap::SitemapFetcher;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Options for one analysis run, collected from the presentation layer.
pub struct RunOptions {
    pub base_url: String,
    pub related_domains: Vec<String>,
    pub threads: usize,
    /// Polite mode: pause this long before each page fetch.
    pub delay_ms: Option<u64>,
    /// Return an unverified /sitemap.xml guess instead of "not found".
    pub fallback_guess: bool,
    pub timeout_secs: u64,
    pub show_progress_bars: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            related_domains: Vec::new(),
            threads: DEFAULT_WORKERS,
            delay_ms: None,
            fallback_guess: false,
            timeout_secs: 10,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting run progress messages
pub type RunProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Run-scoped context: everything one analysis run discovers and produces.
/// Owned by the orchestrating caller and passed through each stage; the core
/// keeps no state of its own between runs.
pub struct AnalysisRun {
    pub site_url: Url,
    pub targets: TargetDomainSet,
    pub sitemap_url: Url,
    pub page_urls: Vec<String>,
    pub results: Vec<PageAnalysis>,
}

/// Parse the user-supplied site URL, assuming https:// when no scheme was
/// given.
pub fn normalize_base_url(input: &str) -> Result<Url, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("No URL provided".to_string());
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| format!("Invalid URL '{}': {}", trimmed, e))?;
    if url.host_str().is_none() {
        return Err(format!("Invalid URL '{}': no host", trimmed));
    }
    Ok(url)
}

/// Resolve the sitemap and flatten it into the page URL list. Sitemap
/// resolution failure is the only terminal error of a run.
pub async fn discover(
    options: &RunOptions,
    progress_callback: Option<RunProgressCallback>,
) -> Result<AnalysisRun, String> {
    let site_url = normalize_base_url(&options.base_url)?;
    let targets = TargetDomainSet::from_site(&site_url, &options.related_domains);

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            callback(msg);
        }
    };

    report(format!("Looking for sitemap on {}", site_url));

    let resolver = SitemapResolver::new().with_fallback_guess(options.fallback_guess);
    let sitemap_url = resolver
        .resolve(&site_url)
        .await
        .map_err(|e| e.to_string())?;

    report(format!("Found sitemap: {}", sitemap_url));
    report("Extracting links...".to_string());

    let fetcher = SitemapFetcher::with_timeout(options.timeout_secs);
    let page_urls = fetcher.extract_links(sitemap_url.as_str()).await;

    report(format!("Found {} links", page_urls.len()));

    Ok(AnalysisRun {
        site_url,
        targets,
        sitemap_url,
        page_urls,
        results: Vec::new(),
    })
}

/// Crawl every discovered page and store the per-page results in the run
/// context.
pub async fn execute_analysis(run: &mut AnalysisRun, options: &RunOptions) -> Result<(), String> {
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new(run.page_urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {pos}/{len} pages")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(Arc::new(pb))
    } else {
        None
    };

    let mut analyzer = Analyzer::with_timeout(run.targets.clone(), options.timeout_secs)
        .with_workers(options.threads);
    if let Some(delay_ms) = options.delay_ms {
        analyzer = analyzer.with_delay(Duration::from_millis(delay_ms));
    }
    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        analyzer =
            analyzer.with_progress_callback(Arc::new(move |done: usize, _total: usize| {
                pb.set_position(done as u64);
            }));
    }

    let results = analyzer
        .analyze(run.page_urls.clone())
        .await
        .map_err(|e| e.to_string())?;

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }

    run.results = results;
    Ok(())
}

/// Per-category page and link totals.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub pages: usize,
    pub internal_links: usize,
}

/// Aggregate results by category, largest categories first.
pub fn summarize_categories(results: &[PageAnalysis]) -> Vec<CategorySummary> {
    let mut by_category: HashMap<String, (usize, usize)> = HashMap::new();
    for result in results {
        let entry = by_category.entry(result.category.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += result.internal_links;
    }

    let mut summaries: Vec<CategorySummary> = by_category
        .into_iter()
        .map(|(category, (pages, internal_links))| CategorySummary {
            category,
            pages,
            internal_links,
        })
        .collect();
    summaries.sort_by(|a, b| {
        b.pages
            .cmp(&a.pages)
            .then_with(|| a.category.cmp(&b.category))
    });
    summaries
}
