//! Synthetic review generation for smoke-testing the discovery loop.
//!
//! Produces a CSV of reviews drawn from the seeded topics, with a
//! hidden topic mixed in at a fixed ratio so a run against the default
//! taxonomy has something to discover.

use std::path::Path;

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use taxonyx_common::Result;
use tracing::info;

use crate::config::DataConfig;

pub const DEFAULT_ROWS: usize = 150;
pub const HIDDEN_TOPIC_RATIO: f64 = 0.15;

const SEEDED_PHRASES: &[&str] = &[
    "The lead actor gave a career-best performance, utterly convincing.",
    "Wooden acting throughout, not one believable scene.",
    "The story kept me guessing until the very end.",
    "Plot holes big enough to drive a truck through.",
    "The CGI was seamless, some of the best effects I have seen.",
    "Cheap-looking effects pulled me right out of the film.",
    "Every frame is composed like a painting, gorgeous camera work.",
    "The score swelled at exactly the right moments.",
    "Forgettable soundtrack that added nothing.",
    "Confident direction, every choice felt deliberate.",
    "The dialogue crackled, endlessly quotable.",
    "Clunky exposition-heavy dialogue in every scene.",
];

const HIDDEN_PHRASES: &[&str] = &[
    "The middle hour crawled, I kept checking my watch.",
    "Way too long, the story could have been told in ninety minutes.",
    "It rushed the ending after dragging through the setup.",
    "Glacial pacing killed whatever tension the premise had.",
    "The film never finds a rhythm, lurching from scene to scene.",
];

/// Generate a synthetic review CSV at `path`. Returns the row count.
pub fn generate_reviews(path: &Path, rows: usize, hidden_ratio: f64, data: &DataConfig) -> Result<usize> {
    let mut rng = rand::thread_rng();

    let hidden_rows = ((rows as f64) * hidden_ratio).round() as usize;
    let mut texts: Vec<&str> = Vec::with_capacity(rows);
    for _ in 0..hidden_rows {
        texts.push(HIDDEN_PHRASES[rng.gen_range(0..HIDDEN_PHRASES.len())]);
    }
    for _ in hidden_rows..rows {
        texts.push(SEEDED_PHRASES[rng.gen_range(0..SEEDED_PHRASES.len())]);
    }
    texts.shuffle(&mut rng);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        data.id_column.as_str(),
        data.date_column.as_str(),
        data.text_column.as_str(),
    ])?;

    for (i, text) in texts.iter().enumerate() {
        let date = Utc::now() - Duration::days(rng.gen_range(0..90));
        writer.write_record([
            &format!("r{:05}", i + 1),
            &date.format("%Y-%m-%d").to_string(),
            &text.to_string(),
        ])?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows, hidden_rows, "synthetic reviews generated");
    Ok(rows)
}
