//! Data models flowing through the extraction pipeline.
//!
//! The pipeline moves a claim through four shapes, each adding one piece of
//! information:
//! - [`ClaimCandidate`]: a matched quantity with its unit and direction
//! - [`ContextedClaim`]: the candidate plus the sentence window explaining it
//! - [`ScoredClaim`]: the contexted claim plus a relevance confidence
//! - [`ClaimRecord`]: the persisted row, written once to the sink
//!
//! [`FetchedDocument`] is the input unit, produced by the fetch and clean
//! collaborators (or loaded from JSON lines).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A cleaned article ready for extraction.
///
/// `cleaned_text` has already had HTML and boilerplate removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedDocument {
    /// The article URL.
    pub url: String,
    /// The host the article was served from, e.g. `www.example.com`.
    pub domain: String,
    /// When the collaborator fetched the page.
    pub fetched_at: DateTime<Utc>,
    /// Article text with markup and boilerplate stripped.
    pub cleaned_text: String,
}

/// A duration unit recognised in time-saved claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

/// The unit a claim's quantity is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// `25%`, `25 percent`, `25 per cent`.
    Percent,
    /// `5 percentage points`, `5 pp`.
    PercentagePoints,
    /// `3 hours`, `30-minute`.
    Time(TimeUnit),
}

impl Unit {
    /// Stable lowercase label used in CSV rows and fingerprints.
    pub fn label(&self) -> &'static str {
        match self {
            Unit::Percent => "percent",
            Unit::PercentagePoints => "percentage_points",
            Unit::Time(TimeUnit::Minutes) => "minutes",
            Unit::Time(TimeUnit::Hours) => "hours",
            Unit::Time(TimeUnit::Days) => "days",
            Unit::Time(TimeUnit::Weeks) => "weeks",
        }
    }

    /// Whether `percent_ceiling` applies to this unit.
    pub fn is_percent_like(&self) -> bool {
        matches!(self, Unit::Percent | Unit::PercentagePoints)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(Unit::Percent),
            "percentage_points" => Ok(Unit::PercentagePoints),
            "minutes" => Ok(Unit::Time(TimeUnit::Minutes)),
            "hours" => Ok(Unit::Time(TimeUnit::Hours)),
            "days" => Ok(Unit::Time(TimeUnit::Days)),
            "weeks" => Ok(Unit::Time(TimeUnit::Weeks)),
            other => Err(format!("unknown unit {other:?}")),
        }
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which way the claimed quantity moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Unspecified,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
            Direction::Unspecified => "unspecified",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A half-open byte range `[start, end)` into some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// A quantity matched in the source text, before any context is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimCandidate {
    /// Byte offset of the number in the source text.
    pub span_start: usize,
    /// Byte offset just past the unit marker.
    pub span_end: usize,
    /// The matched text, e.g. `25%` or `3 hours`.
    pub raw_text: String,
    pub quantity: f64,
    pub unit: Unit,
    pub direction: Direction,
}

impl ClaimCandidate {
    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.span_start, self.span_end)
    }
}

/// A candidate together with the sentences that explain it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextedClaim {
    pub candidate: ClaimCandidate,
    /// Whitespace-collapsed snippet, at most `snippet_max_chars` characters.
    pub context_snippet: String,
    /// Source-text spans of the sentences the snippet was built from.
    pub sentence_boundaries: Vec<TextSpan>,
    /// Byte offset of the candidate's number inside `context_snippet`.
    pub claim_offset: usize,
}

/// A contexted claim with its relevance confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredClaim {
    pub claim: ContextedClaim,
    pub confidence: f64,
}

/// The persisted form of an accepted claim.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub source_url: String,
    pub domain: String,
    pub quantity: f64,
    pub unit: Unit,
    pub direction: Direction,
    pub context_snippet: String,
    pub confidence: f64,
    pub fingerprint: String,
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_labels_parse_back() {
        for unit in [
            Unit::Percent,
            Unit::PercentagePoints,
            Unit::Time(TimeUnit::Minutes),
            Unit::Time(TimeUnit::Hours),
            Unit::Time(TimeUnit::Days),
            Unit::Time(TimeUnit::Weeks),
        ] {
            assert_eq!(unit.label().parse::<Unit>().unwrap(), unit);
        }
        assert!("fortnights".parse::<Unit>().is_err());
    }

    #[test]
    fn test_percent_like_units() {
        assert!(Unit::Percent.is_percent_like());
        assert!(Unit::PercentagePoints.is_percent_like());
        assert!(!Unit::Time(TimeUnit::Hours).is_percent_like());
    }

    #[test]
    fn test_fetched_document_deserialization() {
        let json = r#"{
            "url": "https://example.com/story",
            "domain": "example.com",
            "fetched_at": "2025-05-06T14:30:00Z",
            "cleaned_text": "Teams saved 3 hours."
        }"#;

        let doc: FetchedDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.domain, "example.com");
        assert_eq!(doc.cleaned_text, "Teams saved 3 hours.");
    }

    #[test]
    fn test_claim_record_serializes_labels() {
        let record = ClaimRecord {
            source_url: "https://example.com/story".to_string(),
            domain: "example.com".to_string(),
            quantity: 3.0,
            unit: Unit::Time(TimeUnit::Hours),
            direction: Direction::Unspecified,
            context_snippet: "Teams saved 3 hours.".to_string(),
            confidence: 0.9,
            fingerprint: "abc".to_string(),
            extracted_at: "2025-05-06T14:30:00Z".parse().unwrap(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""unit":"hours""#));
        assert!(json.contains(r#""direction":"unspecified""#));
    }

    #[test]
    fn test_text_span_slice() {
        let span = TextSpan::new(6, 11);
        assert_eq!(span.slice("saved hours"), "hours");
        assert!(span.contains(6));
        assert!(!span.contains(11));
    }
}
