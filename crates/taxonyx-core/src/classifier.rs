//! Review classification against the current topic set.
//!
//! The classifier owns the active `TopicSet` for the duration of a run
//! and is the only thing that mutates it (via `add_topic`). It holds no
//! discovery state of its own: suggestion signals travel inside the
//! `ClassificationResult` to the sentinel, the single discovery tracker.

use serde_json::{Map, Value};
use taxonyx_common::Sentiment;
use taxonyx_llm::{OracleClient, OracleError};
use tracing::{debug, error};

use crate::models::ClassificationResult;
use crate::parser::extract_payload;
use crate::topics::{match_label, TopicSet};

/// Confidence assumed when the oracle omits the field.
const DEFAULT_CONFIDENCE: f64 = 0.7;

pub struct Classifier {
    topics: TopicSet,
    oracle: OracleClient,
}

fn build_system_prompt(topics: &TopicSet) -> String {
    let listed = topics
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You classify short free-text reviews.

AVAILABLE TOPICS:
{listed}

Rules:
1. Match the review to one of the AVAILABLE TOPICS whenever possible
2. If it clearly fits none of them, use "UNCATEGORIZED" as the label
3. When using UNCATEGORIZED you MUST provide suggested_label and suggestion_reason
4. sentiment is one of: positive, negative, neutral, mixed

Output format (a single JSON object):
{{"labels": ["Topic"], "sentiment": "neutral", "confidence": 0.9, "suggested_label": null, "suggestion_reason": null}}

For reviews that fit no topic:
{{"labels": ["UNCATEGORIZED"], "sentiment": "negative", "confidence": 0.85, "suggested_label": "New Topic Name", "suggestion_reason": "Why the listed topics do not cover it"}}"#
    )
}

fn result_from_payload(payload: &Map<String, Value>, topics: &TopicSet) -> ClassificationResult {
    let mut labels: Vec<String> = Vec::new();
    if let Some(raw_labels) = payload.get("labels").and_then(Value::as_array) {
        for raw in raw_labels.iter().filter_map(Value::as_str) {
            if let Some(matched) = match_label(raw, topics) {
                if !labels.contains(&matched) {
                    labels.push(matched);
                }
            }
            // unmatched labels are dropped silently
        }
    }

    let sentiment = payload
        .get("sentiment")
        .and_then(Value::as_str)
        .map(Sentiment::parse)
        .unwrap_or_default();

    let confidence = payload
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

    let string_field = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    ClassificationResult {
        labels,
        sentiment,
        confidence,
        suggested_label: string_field("suggested_label"),
        suggestion_reason: string_field("suggestion_reason"),
    }
}

impl Classifier {
    pub fn new<I, S>(oracle: OracleClient, seed_topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { topics: TopicSet::new(seed_topics), oracle }
    }

    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    pub fn oracle(&self) -> &OracleClient {
        &self.oracle
    }

    /// Add a topic to the active set. Idempotent under normalization.
    pub fn add_topic(&mut self, name: &str) -> bool {
        self.topics.add(name)
    }

    /// Classify one review. Failures are never fatal to the batch: any
    /// oracle or validation error degrades to an empty result with
    /// confidence 0.0.
    pub async fn classify(&self, text: &str, idx: usize) -> ClassificationResult {
        match self.try_classify(text).await {
            Ok(result) => {
                debug!(
                    idx,
                    labels = ?result.labels,
                    sentiment = result.sentiment.as_str(),
                    confidence = result.confidence,
                    "review classified"
                );
                result
            }
            Err(e) => {
                error!(idx, error = %e, "classification failed, emitting empty result");
                ClassificationResult::empty()
            }
        }
    }

    async fn try_classify(&self, text: &str) -> Result<ClassificationResult, OracleError> {
        let system = build_system_prompt(&self.topics);
        let user = format!("Classify:\n\n\"{text}\"");
        let completion = self.oracle.complete(&user, Some(&system)).await?;
        let payload = extract_payload(&completion.content);
        Ok(result_from_payload(&payload, &self.topics))
    }
}
