// Report generation from a finished analysis run

use crate::run::{AnalysisRun, summarize_categories};
use linkmap_scanner::result::PageAnalysis;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Flat link listing with header `URL` — the links.csv artifact. Order is
/// preserved and repeats are kept; downstream consumers ingest this file
/// directly, so the header is part of the contract.
pub fn links_csv(urls: &[String]) -> csv::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["URL"])?;
    for url in urls {
        writer.write_record([url.as_str()])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Analysis table with header `URL,Internal Links,Category` — same contract
/// caveat as `links_csv`.
pub fn analysis_csv(results: &[PageAnalysis]) -> csv::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["URL", "Internal Links", "Category"])?;
    for result in results {
        let count = result.internal_links.to_string();
        writer.write_record([result.url.as_str(), count.as_str(), result.category.as_str()])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn generate_text_report(run: &AnalysisRun) -> String {
    let mut report = String::new();

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                        LINKMAP INTERNAL LINK REPORT\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!("Site:           {}\n", run.site_url));
    report.push_str(&format!("Sitemap:        {}\n", run.sitemap_url));
    report.push_str(&format!(
        "Target domains: {}\n",
        run.targets.iter().collect::<Vec<_>>().join(", ")
    ));
    report.push_str(&format!("Pages found:    {}\n", run.page_urls.len()));
    report.push_str(&format!("Pages crawled:  {}\n", run.results.len()));

    let total_links: usize = run.results.iter().map(|r| r.internal_links).sum();
    report.push_str(&format!("Internal links: {}\n", total_links));
    if !run.results.is_empty() {
        report.push_str(&format!(
            "Links per page: {:.1}\n",
            total_links as f64 / run.results.len() as f64
        ));
    }
    let failed = run.results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        report.push_str(&format!("Failed fetches: {}\n", failed));
    }
    report.push('\n');

    let categories = summarize_categories(&run.results);
    if !categories.is_empty() {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str("CATEGORY BREAKDOWN\n");
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for summary in &categories {
            report.push_str(&format!(
                "  {:<24} {:>5} pages  {:>6} links\n",
                summary.category, summary.pages, summary.internal_links
            ));
        }
        report.push('\n');
    }

    if !run.results.is_empty() {
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        report.push_str("PAGES\n");
        report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        for result in &run.results {
            report.push_str(&format!(
                "  {:>4}  {:<16} {}\n",
                result.internal_links,
                result.category,
                display_path(&result.url)
            ));
            if let Some(ref error) = result.error {
                report.push_str(&format!("        ! {}\n", error));
            }
        }
        report.push('\n');
    }

    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("                              End of Report\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    report
}

pub fn generate_json_report(run: &AnalysisRun) -> Result<String, serde_json::Error> {
    let total_links: usize = run.results.iter().map(|r| r.internal_links).sum();
    let failed = run.results.iter().filter(|r| r.error.is_some()).count();

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkmap",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "site": {
                "url": run.site_url.as_str(),
                "sitemap": run.sitemap_url.as_str(),
                "target_domains": run.targets.iter().collect::<Vec<_>>()
            },
            "summary": {
                "pages_found": run.page_urls.len(),
                "pages_crawled": run.results.len(),
                "internal_links": total_links,
                "failed_fetches": failed,
                "categories": summarize_categories(&run.results)
            },
            "pages": run.results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Path component of a URL for compact listing.
pub fn display_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() { "/".to_string() } else { path }
        })
        .unwrap_or_else(|| url.to_string())
}
