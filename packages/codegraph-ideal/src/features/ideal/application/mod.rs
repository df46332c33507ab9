//! IDEal application layer: per-seed orchestration and result collection

pub mod analysis;
pub mod results;

pub use analysis::{Analysis, AnalysisSummary, SeedState};
pub use results::CollectingSink;
