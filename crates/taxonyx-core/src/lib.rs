//! taxonyx-core — The taxonomy-discovery control loop.
//!
//! Classifier asks the oracle to label each review against the current
//! topic set; the sentinel accumulates misfit signals per candidate
//! topic and promotes a candidate once it crosses the hit threshold;
//! the pipeline relabels previously processed rows retroactively when
//! a promotion fires.

pub mod classifier;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod sentinel;
pub mod topics;

pub use classifier::Classifier;
pub use models::{ClassificationResult, RowOutcome, UNCATEGORIZED};
pub use pipeline::{run_discovery, RunSummary};
pub use sentinel::{AuditEntry, Sentinel};
pub use topics::{match_label, normalize_topic, TopicSet};
