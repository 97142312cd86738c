pub mod report;
pub mod run;

pub use report::ReportFormat;
pub use run::{AnalysisRun, CategorySummary, RunOptions, RunProgressCallback};
