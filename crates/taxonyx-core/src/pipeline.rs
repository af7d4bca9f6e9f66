//! The taxonomy-discovery run loop.
//!
//! Strictly sequential: each review is classified, the sentinel is
//! consulted, and any promotion-triggered retroactive relabel completes
//! before the next review starts. The relabel is a pure rewrite of the
//! in-memory outcome records; the oracle is never re-queried.

use std::time::Instant;

use tracing::{info, instrument};
use uuid::Uuid;

use taxonyx_common::Result;

use crate::classifier::Classifier;
use crate::models::{RowOutcome, UNCATEGORIZED};
use crate::sentinel::Sentinel;
use crate::topics::normalize_topic;

/// End-of-run accounting, in the shape the dashboard consumes.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub rows: usize,
    /// Rows still carrying an `UNCATEGORIZED` label at the end.
    pub uncategorized: usize,
    /// Rows whose classification degraded to the empty result.
    pub failed_rows: usize,
    pub promoted: Vec<String>,
    pub duration_ms: u64,
}

/// Classify every review in order, observing suggestions and applying
/// promotion-triggered retroactive relabels as they fire.
///
/// Per-row failures never abort the run; an audit-log write failure
/// does.
#[instrument(skip_all, fields(rows = texts.len()))]
pub async fn run_discovery(
    texts: &[String],
    classifier: &mut Classifier,
    sentinel: &mut Sentinel,
) -> Result<(Vec<RowOutcome>, RunSummary)> {
    let run_id = Uuid::new_v4();
    let t0 = Instant::now();
    info!(run_id = %run_id, rows = texts.len(), topics = classifier.topics().len(), "discovery run starting");

    let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(texts.len());
    let mut failed_rows = 0usize;

    for (idx, text) in texts.iter().enumerate() {
        let result = classifier.classify(text, idx).await;
        if result.labels.is_empty() && result.confidence == 0.0 {
            failed_rows += 1;
        }

        let suggestion = result.suggestion().map(str::to_string);
        outcomes.push(RowOutcome {
            labels: result.labels,
            sentiment: result.sentiment,
            confidence: result.confidence,
            suggested_label: suggestion.clone(),
            discovery_source: false,
        });

        let Some(suggested) = suggestion else { continue };

        if sentinel.observe(&suggested, text, Some(idx))? {
            let topic = normalize_topic(&suggested);
            classifier.add_topic(&topic);

            // Retroactive relabel: every row ever attributed to this
            // candidate, the confirming row included, in index order.
            let mut rewritten = 0usize;
            for row_idx in sentinel.candidate_indices(&topic) {
                if row_idx < outcomes.len() {
                    relabel(&mut outcomes[row_idx], &topic);
                    rewritten += 1;
                }
            }
            info!(
                topic = %topic,
                at_row = idx,
                rewritten,
                topics_now = classifier.topics().len(),
                "topic promoted, backlog relabeled"
            );
        }
    }

    let summary = RunSummary {
        run_id,
        rows: outcomes.len(),
        uncategorized: outcomes
            .iter()
            .filter(|o| o.labels.iter().any(|l| l == UNCATEGORIZED))
            .count(),
        failed_rows,
        promoted: sentinel.confirmed().to_vec(),
        duration_ms: t0.elapsed().as_millis() as u64,
    };

    info!(
        run_id = %run_id,
        rows = summary.rows,
        uncategorized = summary.uncategorized,
        failed = summary.failed_rows,
        promoted = summary.promoted.len(),
        duration_ms = summary.duration_ms,
        "discovery run complete"
    );

    Ok((outcomes, summary))
}

fn relabel(outcome: &mut RowOutcome, topic: &str) {
    for label in &mut outcome.labels {
        if label == UNCATEGORIZED {
            *label = topic.to_string();
        }
    }
    outcome.discovery_source = true;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use taxonyx_common::Sentiment;
    use taxonyx_llm::{
        CompletionBackend, CompletionRequest, CompletionResponse, OracleClient, OracleError,
        OracleSettings,
    };
    use tempfile::TempDir;

    /// Plays the oracle: reviews mentioning "pacing" get the hidden
    /// topic: a direct label once the system prompt lists it, an
    /// UNCATEGORIZED suggestion before that. Everything else
    /// maps to "Plot".
    struct ScriptedOracle;

    #[async_trait]
    impl CompletionBackend for ScriptedOracle {
        async fn complete(
            &self,
            req: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, OracleError> {
            let system = &req.messages[0].content;
            let review = &req.messages[1].content;

            let content = if review.to_lowercase().contains("pacing") {
                if system.contains("Pacing Issues") {
                    r#"{"labels": ["Pacing Issues"], "sentiment": "negative", "confidence": 0.9}"#
                        .to_string()
                } else {
                    r#"{"labels": ["UNCATEGORIZED"], "sentiment": "negative", "confidence": 0.85,
                        "suggested_label": "Pacing Issues",
                        "suggestion_reason": "complains about runtime pacing"}"#
                        .to_string()
                }
            } else {
                r#"{"labels": ["Plot"], "sentiment": "positive", "confidence": 0.9}"#.to_string()
            };

            Ok(CompletionResponse {
                content,
                model: "scripted".to_string(),
                prompt_tokens: 20,
                completion_tokens: 10,
            })
        }

        fn model_id(&self) -> &str { "scripted" }
        fn is_local(&self) -> bool { true }
    }

    struct FailingOracle;

    #[async_trait]
    impl CompletionBackend for FailingOracle {
        async fn complete(
            &self,
            _req: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, OracleError> {
            Err(OracleError::Unavailable("connection refused".to_string()))
        }

        fn model_id(&self) -> &str { "down" }
        fn is_local(&self) -> bool { true }
    }

    fn classifier_with(backend: Arc<dyn CompletionBackend>, seeds: &[&str]) -> Classifier {
        let oracle = OracleClient::new(
            backend,
            OracleSettings { attempts: 1, ..Default::default() },
        );
        Classifier::new(oracle, seeds.iter().copied())
    }

    #[tokio::test]
    async fn test_end_to_end_discovery_and_retroactive_relabel() {
        let dir = TempDir::new().unwrap();
        let mut classifier = classifier_with(Arc::new(ScriptedOracle), &["Acting", "Plot"]);
        let mut sentinel = Sentinel::new(2, dir.path().join("log.json"));

        let texts: Vec<String> = vec![
            "the pacing dragged badly".to_string(),
            "pacing was glacial in the middle act".to_string(),
            "pacing problems again".to_string(),
        ];

        let (outcomes, summary) =
            run_discovery(&texts, &mut classifier, &mut sentinel).await.unwrap();

        // Confirmation fired on row 1; rows 0 and 1 were rewritten.
        assert_eq!(outcomes[0].labels, ["Pacing Issues"]);
        assert!(outcomes[0].discovery_source);
        assert_eq!(outcomes[1].labels, ["Pacing Issues"]);
        assert!(outcomes[1].discovery_source);

        // Row 2 was classified against the grown topic set and matched
        // the promoted topic directly, no re-suggestion.
        assert_eq!(outcomes[2].labels, ["Pacing Issues"]);
        assert!(!outcomes[2].discovery_source);
        assert!(outcomes[2].suggested_label.is_none());

        let topics: Vec<&str> = classifier.topics().iter().collect();
        assert_eq!(topics, ["Acting", "Plot", "Pacing Issues"]);
        assert_eq!(summary.promoted, ["Pacing Issues"]);
        assert_eq!(summary.uncategorized, 0);
    }

    #[tokio::test]
    async fn test_retroactive_rewrite_leaves_other_rows_untouched() {
        let dir = TempDir::new().unwrap();
        let mut classifier = classifier_with(Arc::new(ScriptedOracle), &["Acting", "Plot"]);
        let mut sentinel = Sentinel::new(3, dir.path().join("log.json"));

        // Misfits land at indices 2, 5 and 9; threshold 3 is reached at 9.
        let texts: Vec<String> = (0..10)
            .map(|i| {
                if [2, 5, 9].contains(&i) {
                    format!("review {i}: pacing is off")
                } else {
                    format!("review {i}: a solid plot")
                }
            })
            .collect();

        let (outcomes, _) =
            run_discovery(&texts, &mut classifier, &mut sentinel).await.unwrap();

        for idx in [2usize, 5, 9] {
            assert_eq!(outcomes[idx].labels, ["Pacing Issues"], "row {idx}");
            assert!(outcomes[idx].discovery_source, "row {idx}");
        }
        for idx in [0usize, 1, 3, 4, 6, 7, 8] {
            assert_eq!(outcomes[idx].labels, ["Plot"], "row {idx}");
            assert!(!outcomes[idx].discovery_source, "row {idx}");
        }
    }

    #[tokio::test]
    async fn test_oracle_failure_isolated_per_row() {
        let dir = TempDir::new().unwrap();
        let mut classifier = classifier_with(Arc::new(FailingOracle), &["Plot"]);
        let mut sentinel = Sentinel::new(2, dir.path().join("log.json"));

        let texts: Vec<String> =
            vec!["first review".to_string(), "second review".to_string()];

        let (outcomes, summary) =
            run_discovery(&texts, &mut classifier, &mut sentinel).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert!(outcome.labels.is_empty());
            assert_eq!(outcome.sentiment, Sentiment::Neutral);
            assert_eq!(outcome.confidence, 0.0);
        }
        assert_eq!(summary.failed_rows, 2);
        assert!(summary.promoted.is_empty());
    }

    #[tokio::test]
    async fn test_summary_counts_lingering_uncategorized() {
        let dir = TempDir::new().unwrap();
        let mut classifier = classifier_with(Arc::new(ScriptedOracle), &["Acting", "Plot"]);
        // Threshold never reached: the single misfit stays UNCATEGORIZED.
        let mut sentinel = Sentinel::new(5, dir.path().join("log.json"));

        let texts: Vec<String> = vec![
            "great plot".to_string(),
            "pacing dragged".to_string(),
        ];

        let (outcomes, summary) =
            run_discovery(&texts, &mut classifier, &mut sentinel).await.unwrap();

        assert_eq!(outcomes[1].labels, [UNCATEGORIZED]);
        assert_eq!(outcomes[1].suggested_label.as_deref(), Some("Pacing Issues"));
        assert_eq!(summary.uncategorized, 1);
        assert_eq!(sentinel.candidate_indices("Pacing Issues"), [1]);
    }
}
