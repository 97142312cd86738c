use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use linkmap_core::report::{self, ReportFormat};
use linkmap_core::run::{self, AnalysisRun, RunOptions, RunProgressCallback};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Split a comma-separated domain list, dropping empty entries.
pub fn parse_related_domains(raw: Option<&String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Render the discovered link list in the requested format.
pub fn links_output(run: &AnalysisRun, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Csv => report::links_csv(&run.page_urls).map_err(|e| e.to_string()),
        ReportFormat::Json => {
            serde_json::to_string_pretty(&run.page_urls).map_err(|e| e.to_string())
        }
        ReportFormat::Text => Ok(run.page_urls.join("\n") + "\n"),
    }
}

/// Render the analysis results in the requested format.
pub fn analysis_output(run: &AnalysisRun, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(report::generate_text_report(run)),
        ReportFormat::Csv => report::analysis_csv(&run.results).map_err(|e| e.to_string()),
        ReportFormat::Json => report::generate_json_report(run).map_err(|e| e.to_string()),
    }
}

pub async fn handle_links(sub_matches: &ArgMatches, quiet: bool) {
    tracing_subscriber::fmt::init();

    let options = RunOptions {
        base_url: sub_matches
            .get_one::<String>("url")
            .cloned()
            .unwrap_or_default(),
        fallback_guess: sub_matches.get_flag("fallback-guess"),
        timeout_secs: *sub_matches.get_one::<u64>("timeout").unwrap_or(&10),
        ..RunOptions::default()
    };

    let run_ctx = discover_with_status(&options, quiet).await;

    if run_ctx.page_urls.is_empty() {
        eprintln!(
            "{} Sitemap at {} yielded no links",
            "✗".red().bold(),
            run_ctx.sitemap_url
        );
        std::process::exit(1);
    }

    if !quiet {
        println!(
            "{} Found {} links via {}",
            "✓".green().bold(),
            run_ctx.page_urls.len(),
            run_ctx.sitemap_url
        );
    }

    let format = report_format(sub_matches);
    let content = match links_output(&run_ctx, format) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    deliver(&content, sub_matches.get_one::<PathBuf>("output"), quiet);
}

pub async fn handle_analyze(sub_matches: &ArgMatches, quiet: bool) {
    tracing_subscriber::fmt::init();

    let options = RunOptions {
        base_url: sub_matches
            .get_one::<String>("url")
            .cloned()
            .unwrap_or_default(),
        related_domains: parse_related_domains(sub_matches.get_one::<String>("related-domains")),
        threads: *sub_matches.get_one::<usize>("threads").unwrap_or(&4),
        delay_ms: sub_matches.get_one::<u64>("delay").copied(),
        fallback_guess: sub_matches.get_flag("fallback-guess"),
        timeout_secs: *sub_matches.get_one::<u64>("timeout").unwrap_or(&10),
        show_progress_bars: !quiet,
    };

    let mut run_ctx = discover_with_status(&options, quiet).await;

    if run_ctx.page_urls.is_empty() {
        eprintln!(
            "{} Sitemap at {} yielded no links",
            "✗".red().bold(),
            run_ctx.sitemap_url
        );
        std::process::exit(1);
    }

    if !quiet {
        println!(
            "\n🔗 Analyzing {}",
            run_ctx.site_url.host_str().unwrap_or("site")
        );
        println!("Pages: {}", run_ctx.page_urls.len());
        println!("Workers: {}", options.threads);
        println!(
            "Target domains: {}\n",
            run_ctx.targets.iter().collect::<Vec<_>>().join(", ")
        );
    }

    if let Err(e) = run::execute_analysis(&mut run_ctx, &options).await {
        eprintln!("{} Analysis failed: {}", "✗".red().bold(), e);
        std::process::exit(1);
    }

    if !quiet {
        println!("{} Analysis complete!\n", "✓".green().bold());
    }

    let format = report_format(sub_matches);
    let content = match analysis_output(&run_ctx, format) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    deliver(&content, sub_matches.get_one::<PathBuf>("output"), quiet);
}

/// Run sitemap discovery behind a spinner; exits the process on failure,
/// which for this pipeline only happens when no sitemap resolves.
async fn discover_with_status(options: &RunOptions, quiet: bool) -> AnalysisRun {
    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(Arc::new(pb))
    };

    let progress_callback: Option<RunProgressCallback> = spinner.as_ref().map(|pb| {
        let pb = pb.clone();
        Arc::new(move |msg: String| pb.set_message(msg)) as RunProgressCallback
    });

    let result = run::discover(options, progress_callback).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match result {
        Ok(run_ctx) => run_ctx,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn deliver(content: &str, output: Option<&PathBuf>, quiet: bool) {
    match output {
        Some(path) => {
            if let Err(e) = report::save_report(content, path) {
                eprintln!(
                    "{} Failed to write {}: {}",
                    "✗".red().bold(),
                    path.display(),
                    e
                );
                std::process::exit(1);
            }
            debug!("wrote {} bytes to {}", content.len(), path.display());
            if !quiet {
                println!("{} Saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", content),
    }
}

fn report_format(sub_matches: &ArgMatches) -> ReportFormat {
    sub_matches
        .get_one::<String>("format")
        .and_then(|s| ReportFormat::from_str(s))
        .unwrap_or(ReportFormat::Text)
}
