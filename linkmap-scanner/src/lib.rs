pub mod analyzer;
mod client;
pub mod content;
pub mod error;
pub mod resolver;
pub mod result;
pub mod sitemap;

pub use analyzer::{Analyzer, ProgressCallback};
pub use content::TargetDomainSet;
pub use error::ScanError;
pub use resolver::SitemapResolver;
pub use result::PageAnalysis;
pub use sitemap::{SitemapDocument, SitemapFetcher};
