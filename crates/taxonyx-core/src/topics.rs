//! Topic identity and label-matching policy.
//!
//! `normalize_topic` is the one equality key used everywhere topics are
//! compared, stored, or looked up. `match_label` is the deliberately
//! loose containment policy for mapping raw oracle labels onto the
//! active topic set; its first-match-over-insertion-order behavior is
//! part of the contract and is tested as such.

use crate::models::UNCATEGORIZED;

/// Stable title-case key: trim, collapse inner whitespace, uppercase
/// the first character of each word, lowercase the rest.
pub fn normalize_topic(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The active topic set: ordered, duplicate-free under `normalize_topic`.
#[derive(Debug, Clone, Default)]
pub struct TopicSet {
    topics: Vec<String>,
}

impl TopicSet {
    pub fn new<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for topic in seed {
            set.add(topic.as_ref());
        }
        set
    }

    /// Add a topic. Returns false if it was already present (or blank)
    /// under normalization; calling twice with the same name mutates
    /// the set only once.
    pub fn add(&mut self, name: &str) -> bool {
        let clean = normalize_topic(name);
        if clean.is_empty() || self.topics.contains(&clean) {
            return false;
        }
        self.topics.push(clean);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        let clean = normalize_topic(name);
        self.topics.contains(&clean)
    }

    /// Insertion order, which is also prompt order and match order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// Map a raw oracle label onto the topic set.
///
/// `UNCATEGORIZED` passes through case-insensitively. Otherwise the
/// first topic (in set order) where either string case-insensitively
/// contains the other wins. Labels matching nothing map to `None` and
/// are dropped by the caller.
pub fn match_label(raw: &str, topics: &TopicSet) -> Option<String> {
    let clean = raw.trim();
    if clean.is_empty() {
        return None;
    }
    if clean.eq_ignore_ascii_case(UNCATEGORIZED) {
        return Some(UNCATEGORIZED.to_string());
    }

    let lower = clean.to_lowercase();
    topics
        .iter()
        .find(|known| {
            let known_lower = known.to_lowercase();
            known_lower.contains(&lower) || lower.contains(&known_lower)
        })
        .map(str::to_string)
}
