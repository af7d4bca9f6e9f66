//! taxonyx-report — Tabular input/output and the end-of-run dashboard.

pub mod dashboard;
pub mod table;

pub use dashboard::{render_dashboard, render_taxonomy_summary};
pub use table::{export_results, load_reviews, ReviewTable};
