use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkmap")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkmap")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress status output, print only the result").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("links")
                .about("Discover a site's sitemap and extract every listed page URL")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The site to inspect (scheme optional, https:// is assumed)"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the link list to a file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Output format: csv, text, json")
                        .value_parser(["csv", "text", "json"])
                        .default_value("csv"),
                )
                .arg(
                    arg!(--"fallback-guess")
                        .required(false)
                        .help(
                            "Fall back to an unverified /sitemap.xml guess when robots.txt and \
                        the conventional paths all fail",
                        )
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Crawl every sitemap page and measure in-content internal linking per page",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The site to analyze (scheme optional, https:// is assumed)"),
                )
                .arg(
                    arg!(-d --"related-domains" <DOMAINS>)
                        .required(false)
                        .help(
                            "Comma-separated domains also counted as internal \
                        (e.g. a sister brand)",
                        ),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool (max 20)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("4"),
                )
                .arg(
                    arg!(--"delay" <MILLIS>)
                        .required(false)
                        .help("Polite mode: pause this long before each page fetch")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the report to a file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, csv, json")
                        .value_parser(["text", "csv", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"fallback-guess")
                        .required(false)
                        .help(
                            "Fall back to an unverified /sitemap.xml guess when robots.txt and \
                        the conventional paths all fail",
                        )
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                ),
        )
}
