//! The sentinel — dynamic topic discovery tracker.
//!
//! Accumulates misfit signals per candidate topic and promotes a
//! candidate to a confirmed topic exactly once, when its hit count
//! crosses the configured threshold. Every promotion appends one entry
//! to the durable JSON audit log before the in-memory confirmed list is
//! updated; a failed audit write aborts the promotion and surfaces as
//! an error.
//!
//! Single-process, single-writer. The audit file is rewritten whole on
//! each promotion and is not safe for concurrent writers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taxonyx_common::Result;
use tracing::{info, warn};

use crate::topics::normalize_topic;

/// Sample reviews retained per candidate as audit evidence.
const MAX_SAMPLES: usize = 5;
/// Samples are truncated to this many characters.
const SAMPLE_LEN: usize = 200;

/// One audit-log entry, written on promotion. The log file is a JSON
/// array of these, append-only across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub topic: String,
    pub hits: u32,
    /// ISO-8601 timestamp of the first observation.
    pub first_seen: String,
    pub samples: Vec<String>,
}

/// Candidate state: `unseen → pending(count) → confirmed`.
/// Entries are never removed; after confirmation the index list stays
/// available for retroactive relabeling.
#[derive(Debug, Clone)]
struct Candidate {
    hits: u32,
    first_seen: DateTime<Utc>,
    samples: Vec<String>,
    indices: Vec<usize>,
}

pub struct Sentinel {
    threshold: u32,
    candidates: HashMap<String, Candidate>,
    confirmed: Vec<String>,
    audit_path: PathBuf,
}

impl Sentinel {
    pub fn new(threshold: u32, audit_path: impl Into<PathBuf>) -> Self {
        Self {
            threshold: threshold.max(1),
            candidates: HashMap::new(),
            confirmed: Vec::new(),
            audit_path: audit_path.into(),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Record one suggestion for a candidate topic. Returns `Ok(true)`
    /// exactly on the observation whose running count first reaches the
    /// threshold; `Ok(false)` before and ever after.
    ///
    /// Empty/whitespace names are a no-op. Confirmed names short-circuit
    /// without touching the count.
    pub fn observe(&mut self, suggested: &str, text: &str, idx: Option<usize>) -> Result<bool> {
        let key = normalize_topic(suggested);
        if key.is_empty() {
            return Ok(false);
        }
        if self.confirmed.contains(&key) {
            return Ok(false);
        }

        let candidate = self.candidates.entry(key.clone()).or_insert_with(|| Candidate {
            hits: 0,
            first_seen: Utc::now(),
            samples: Vec::new(),
            indices: Vec::new(),
        });

        candidate.hits += 1;
        if let Some(idx) = idx {
            candidate.indices.push(idx);
        }
        if candidate.samples.len() < MAX_SAMPLES {
            candidate.samples.push(truncate(text, SAMPLE_LEN));
        }

        if candidate.hits >= self.threshold {
            self.promote(&key)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// All row indices ever attributed to a candidate, in observation
    /// order. Works for pending and confirmed candidates alike.
    pub fn candidate_indices(&self, topic: &str) -> Vec<usize> {
        let key = normalize_topic(topic);
        self.candidates
            .get(&key)
            .map(|c| c.indices.clone())
            .unwrap_or_default()
    }

    /// Candidates still below threshold, with their counts,
    /// highest count first.
    pub fn pending(&self) -> Vec<(String, u32)> {
        let mut pending: Vec<(String, u32)> = self
            .candidates
            .iter()
            .filter(|(name, _)| !self.confirmed.contains(name))
            .map(|(name, c)| (name.clone(), c.hits))
            .collect();
        pending.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        pending
    }

    pub fn confirmed(&self) -> &[String] {
        &self.confirmed
    }

    /// Human-readable status dump for the end-of-run report.
    pub fn status(&self) -> String {
        let mut lines = vec![
            "Sentinel status".to_string(),
            "-".repeat(30),
            format!("Threshold: {}", self.threshold),
            format!("Watching:  {} candidates", self.pending().len()),
            format!("Promoted:  {} topics", self.confirmed.len()),
        ];

        if !self.confirmed.is_empty() {
            lines.push(String::new());
            lines.push("Promoted:".to_string());
            for topic in &self.confirmed {
                lines.push(format!("  * {topic}"));
            }
        }

        let pending = self.pending();
        if !pending.is_empty() {
            lines.push(String::new());
            lines.push("Pending:".to_string());
            for (topic, hits) in pending {
                let filled = hits.min(self.threshold) as usize;
                let bar: String = "█".repeat(filled)
                    + &"░".repeat((self.threshold as usize).saturating_sub(filled));
                lines.push(format!("  * {topic} [{bar}] {hits}/{}", self.threshold));
            }
        }

        lines.join("\n")
    }

    /// Promote a candidate: durable audit entry first, then the
    /// in-memory confirmed list. Promotion is atomic with respect to
    /// the observation that triggered it.
    fn promote(&mut self, topic: &str) -> Result<()> {
        let candidate = &self.candidates[topic];
        info!(
            topic,
            hits = candidate.hits,
            "new category detected, promoting into taxonomy"
        );

        self.append_audit(AuditEntry {
            topic: topic.to_string(),
            hits: candidate.hits,
            first_seen: candidate.first_seen.to_rfc3339(),
            samples: candidate.samples.clone(),
        })?;

        self.confirmed.push(topic.to_string());
        Ok(())
    }

    /// Read-append-rewrite the JSON audit array. An unreadable or
    /// corrupt existing file is treated as empty; a write failure
    /// propagates.
    fn append_audit(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = read_audit_log(&self.audit_path);
        entries.push(entry);

        if let Some(parent) = self.audit_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.audit_path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// Load all audit entries from a log file. Missing or corrupt files
/// read as empty.
pub fn read_audit_log(path: &Path) -> Vec<AuditEntry> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "audit log unreadable, treating as empty");
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sentinel_in(dir: &TempDir, threshold: u32) -> Sentinel {
        Sentinel::new(threshold, dir.path().join("discovery_log.json"))
    }

    #[test]
    fn test_promotion_is_exactly_once() {
        let dir = TempDir::new().unwrap();
        let mut s = sentinel_in(&dir, 3);

        assert!(!s.observe("Pacing Issues", "slow", Some(0)).unwrap());
        assert!(!s.observe("pacing issues", "dragged", Some(1)).unwrap());
        // threshold reached exactly here
        assert!(s.observe("PACING ISSUES", "too long", Some(2)).unwrap());
        // sticky: never re-triggers, never grows the confirmed list
        assert!(!s.observe("Pacing Issues", "still slow", Some(3)).unwrap());
        assert_eq!(s.confirmed(), ["Pacing Issues"]);
    }

    #[test]
    fn test_confirmed_short_circuits_before_counting() {
        let dir = TempDir::new().unwrap();
        let mut s = sentinel_in(&dir, 1);

        assert!(s.observe("Pacing Issues", "slow", Some(0)).unwrap());
        s.observe("Pacing Issues", "late", Some(1)).unwrap();
        // the post-confirmation observation did not attribute its index
        assert_eq!(s.candidate_indices("Pacing Issues"), [0]);
    }

    #[test]
    fn test_index_attribution_complete_and_ordered() {
        let dir = TempDir::new().unwrap();
        let mut s = sentinel_in(&dir, 10);

        for idx in [2usize, 5, 9] {
            s.observe("Pacing Issues", "sample", Some(idx)).unwrap();
        }
        assert_eq!(s.candidate_indices("pacing issues"), [2, 5, 9]);
        // unknown candidate reads empty
        assert!(s.candidate_indices("Catering").is_empty());
    }

    #[test]
    fn test_blank_suggestion_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let mut s = sentinel_in(&dir, 1);
        assert!(!s.observe("", "text", Some(0)).unwrap());
        assert!(!s.observe("   ", "text", Some(1)).unwrap());
        assert!(s.pending().is_empty());
    }

    #[test]
    fn test_samples_capped_and_truncated() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("discovery_log.json");
        let mut s = Sentinel::new(8, &log_path);
        let long_text = "x".repeat(500);
        for idx in 0..8 {
            s.observe("Pacing Issues", &long_text, Some(idx)).unwrap();
        }
        let entries = read_audit_log(&log_path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].samples.len(), MAX_SAMPLES);
        assert!(entries[0].samples.iter().all(|s| s.chars().count() == SAMPLE_LEN));
    }

    #[test]
    fn test_audit_log_appends_across_promotions() {
        let dir = TempDir::new().unwrap();
        let mut s = sentinel_in(&dir, 1);
        s.observe("Pacing Issues", "slow", Some(0)).unwrap();
        s.observe("Marketing Hype", "overhyped", Some(1)).unwrap();

        let entries = read_audit_log(&dir.path().join("discovery_log.json"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].topic, "Pacing Issues");
        assert_eq!(entries[1].topic, "Marketing Hype");
        assert_eq!(entries[0].hits, 1);
    }

    #[test]
    fn test_corrupt_audit_log_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("discovery_log.json");
        fs::write(&log_path, "{ not json").unwrap();
        assert!(read_audit_log(&log_path).is_empty());

        // a promotion over the corrupt file starts a fresh array
        let mut s = Sentinel::new(1, &log_path);
        s.observe("Pacing Issues", "slow", Some(0)).unwrap();
        assert_eq!(read_audit_log(&log_path).len(), 1);
    }

    #[test]
    fn test_pending_sorted_by_count() {
        let dir = TempDir::new().unwrap();
        let mut s = sentinel_in(&dir, 10);
        s.observe("Pacing Issues", "a", Some(0)).unwrap();
        s.observe("Pacing Issues", "b", Some(1)).unwrap();
        s.observe("Marketing Hype", "c", Some(2)).unwrap();

        let pending = s.pending();
        assert_eq!(pending[0], ("Pacing Issues".to_string(), 2));
        assert_eq!(pending[1], ("Marketing Hype".to_string(), 1));
    }
}
