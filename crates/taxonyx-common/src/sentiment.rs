//! Sentiment values attached to every classified review.

use serde::{Deserialize, Serialize};

/// The four sentiment values the classifier is allowed to emit.
/// Anything else the oracle returns normalizes to `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
    Mixed,
}

impl Sentiment {
    /// Parse a raw sentiment string, case/whitespace-insensitive.
    /// Unknown values fall back to `Neutral`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "mixed"    => Sentiment::Mixed,
            _          => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral  => "neutral",
            Sentiment::Mixed    => "mixed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!(Sentiment::parse("positive"), Sentiment::Positive);
        assert_eq!(Sentiment::parse("  NEGATIVE "), Sentiment::Negative);
        assert_eq!(Sentiment::parse("Mixed"), Sentiment::Mixed);
    }

    #[test]
    fn test_unknown_normalizes_to_neutral() {
        assert_eq!(Sentiment::parse("ecstatic"), Sentiment::Neutral);
        assert_eq!(Sentiment::parse(""), Sentiment::Neutral);
        assert_eq!(Sentiment::parse("n/a"), Sentiment::Neutral);
    }
}
