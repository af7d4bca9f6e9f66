//! Core value types shared by the classifier, sentinel and pipeline.

use serde::{Deserialize, Serialize};
use taxonyx_common::Sentiment;

/// Label the oracle must emit when a review fits no listed topic.
pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

/// Per-review outcome of one oracle round trip.
/// Immutable once constructed; the pipeline owns any later relabeling
/// via its own `RowOutcome` records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Normalized labels, each a known topic or `UNCATEGORIZED`.
    pub labels: Vec<String>,
    pub sentiment: Sentiment,
    /// In [0, 1]. Zero means classification failed outright.
    pub confidence: f64,
    pub suggested_label: Option<String>,
    pub suggestion_reason: Option<String>,
}

impl ClassificationResult {
    /// The degraded result emitted when classification fails for a row.
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            sentiment: Sentiment::Neutral,
            confidence: 0.0,
            suggested_label: None,
            suggestion_reason: None,
        }
    }

    /// Whether the oracle flagged this review as not fitting any topic.
    pub fn is_unknown(&self) -> bool {
        self.labels.iter().any(|l| l == UNCATEGORIZED)
    }

    /// The suggested new topic, present only for unknown-flagged reviews.
    pub fn suggestion(&self) -> Option<&str> {
        if self.is_unknown() {
            self.suggested_label.as_deref().filter(|s| !s.trim().is_empty())
        } else {
            None
        }
    }
}

/// One output row accumulated by the pipeline. Unlike
/// `ClassificationResult` these records are rewritten in place when a
/// topic promotion retroactively relabels earlier rows.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub labels: Vec<String>,
    pub sentiment: Sentiment,
    pub confidence: f64,
    /// Only set while the row is (or was) unknown-flagged.
    pub suggested_label: Option<String>,
    /// True once this row's label came from a sentinel promotion.
    pub discovery_source: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_degraded() {
        let r = ClassificationResult::empty();
        assert!(r.labels.is_empty());
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert_eq!(r.confidence, 0.0);
        assert!(!r.is_unknown());
    }

    #[test]
    fn test_suggestion_requires_unknown_flag() {
        let mut r = ClassificationResult::empty();
        r.suggested_label = Some("Pacing Issues".to_string());
        assert_eq!(r.suggestion(), None);

        r.labels.push(UNCATEGORIZED.to_string());
        assert_eq!(r.suggestion(), Some("Pacing Issues"));
    }

    #[test]
    fn test_blank_suggestion_is_ignored() {
        let mut r = ClassificationResult::empty();
        r.labels.push(UNCATEGORIZED.to_string());
        r.suggested_label = Some("   ".to_string());
        assert_eq!(r.suggestion(), None);
    }
}
