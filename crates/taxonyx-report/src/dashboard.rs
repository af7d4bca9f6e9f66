//! End-of-run console dashboard.
//!
//! Rendering returns strings; the binary prints them. The dashboard is
//! program output, not logging.

use std::collections::HashMap;

use chrono::Local;
use taxonyx_common::Sentiment;
use taxonyx_core::{RowOutcome, RunSummary, UNCATEGORIZED};
use taxonyx_llm::UsageSnapshot;

const WIDTH: usize = 60;

/// Render the full dashboard as a string.
pub fn render_dashboard(
    outcomes: &[RowOutcome],
    summary: &RunSummary,
    usage: &UsageSnapshot,
) -> String {
    let mut topic_counts: HashMap<&str, usize> = HashMap::new();
    for outcome in outcomes {
        for label in &outcome.labels {
            *topic_counts.entry(label.as_str()).or_default() += 1;
        }
    }
    let uncategorized = topic_counts.get(UNCATEGORIZED).copied().unwrap_or(0);

    let mut sorted_topics: Vec<(&str, usize)> = topic_counts
        .iter()
        .filter(|(topic, _)| **topic != UNCATEGORIZED)
        .map(|(t, c)| (*t, *c))
        .collect();
    sorted_topics.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut sentiment_counts: HashMap<Sentiment, usize> = HashMap::new();
    for outcome in outcomes {
        *sentiment_counts.entry(outcome.sentiment).or_default() += 1;
    }

    let mut out = String::new();
    let rule = "=".repeat(WIDTH);
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&center("TAXONYX RUN REPORT"));
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&format!("  Generated:     {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("  Run id:        {}\n", summary.run_id));
    out.push_str(&format!("  Total reviews: {}\n", summary.rows));
    out.push_str(&format!("  Uncategorized: {uncategorized}\n"));
    out.push_str(&format!("  Failed rows:   {}\n", summary.failed_rows));

    out.push_str("\n  TOP TOPICS:\n");
    for (rank, (topic, count)) in sorted_topics.iter().take(5).enumerate() {
        let bar = "#".repeat((count / 2).min(20).max(1));
        out.push_str(&format!("    {}. {:<24} {} ({})\n", rank + 1, topic, bar, count));
    }
    if sorted_topics.is_empty() {
        out.push_str("    (none)\n");
    }

    out.push_str("\n  SENTIMENT:\n");
    let total = outcomes.len().max(1);
    for sentiment in [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral, Sentiment::Mixed] {
        let count = sentiment_counts.get(&sentiment).copied().unwrap_or(0);
        let pct = count * 100 / total;
        let bar = "#".repeat(pct / 5);
        out.push_str(&format!("    {:<10} {:<20} {} ({}%)\n", sentiment.as_str(), bar, count, pct));
    }

    out.push('\n');
    if summary.promoted.is_empty() {
        out.push_str("  No new topics discovered.\n");
    } else {
        out.push_str("  NEW TOPICS FOUND:\n");
        for topic in &summary.promoted {
            out.push_str(&format!("    + {topic}\n"));
        }
    }

    out.push_str("\n  USAGE:\n");
    out.push_str(&format!("    Oracle calls: {}\n", usage.calls));
    if usage.tokens > 0 {
        out.push_str(&format!("    Tokens:       {}\n", usage.tokens));
    }
    if usage.calls > 0 {
        out.push_str(&format!("    Avg latency:  {}ms\n", usage.avg_latency_ms()));
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

/// Render how the taxonomy grew over the run.
pub fn render_taxonomy_summary(seed: &[String], current: &[String]) -> String {
    let discovered: Vec<&String> = current.iter().filter(|t| !seed.contains(t)).collect();

    let mut out = String::new();
    out.push_str("TOPIC TAXONOMY:\n");
    out.push_str(&format!("  Started with {} topics\n", seed.len()));
    for topic in seed {
        out.push_str(&format!("    * {topic}\n"));
    }
    if discovered.is_empty() {
        out.push_str("\n  No new topics added.\n");
    } else {
        out.push_str(&format!("\n  Discovered {} new:\n", discovered.len()));
        for topic in discovered {
            out.push_str(&format!("    + {topic}\n"));
        }
    }
    out
}

fn center(text: &str) -> String {
    let pad = WIDTH.saturating_sub(text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}
