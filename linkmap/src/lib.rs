// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used helpers for convenience
pub use handlers::{analysis_output, links_output, parse_related_domains};
