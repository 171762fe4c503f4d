//! Rule tables for claim matching and scoring.
//!
//! All lookups take lowercased token text. The tables are plain data so they
//! can be reviewed and tuned without touching the matching code.

use crate::models::{Direction, TimeUnit, Unit};

/// A percent marker that may follow a number, as a sequence of token texts.
pub struct UnitRule {
    pub phrase: &'static [&'static str],
    pub unit: Unit,
}

/// Longest phrases first; the first rule that matches wins.
pub const PERCENT_RULES: &[UnitRule] = &[
    UnitRule { phrase: &["percentage", "points"], unit: Unit::PercentagePoints },
    UnitRule { phrase: &["percentage", "point"], unit: Unit::PercentagePoints },
    UnitRule { phrase: &["per", "cent"], unit: Unit::Percent },
    UnitRule { phrase: &["%"], unit: Unit::Percent },
    UnitRule { phrase: &["percent"], unit: Unit::Percent },
    UnitRule { phrase: &["percentage"], unit: Unit::Percent },
    UnitRule { phrase: &["pct"], unit: Unit::Percent },
    UnitRule { phrase: &["pp"], unit: Unit::PercentagePoints },
];

const TIME_UNITS: &[(&str, TimeUnit)] = &[
    ("minute", TimeUnit::Minutes),
    ("minutes", TimeUnit::Minutes),
    ("min", TimeUnit::Minutes),
    ("mins", TimeUnit::Minutes),
    ("hour", TimeUnit::Hours),
    ("hours", TimeUnit::Hours),
    ("hr", TimeUnit::Hours),
    ("hrs", TimeUnit::Hours),
    ("day", TimeUnit::Days),
    ("days", TimeUnit::Days),
    ("week", TimeUnit::Weeks),
    ("weeks", TimeUnit::Weeks),
    ("wk", TimeUnit::Weeks),
    ("wks", TimeUnit::Weeks),
];

/// Words allowed between a number and its time unit: `3 more hours`.
pub const TIME_MODIFIERS: &[&str] = &[
    "more", "extra", "fewer", "less", "additional", "full", "whole", "working", "work",
];

const DIRECTION_WORDS: &[(&str, Direction)] = &[
    ("increase", Direction::Increase),
    ("increased", Direction::Increase),
    ("increases", Direction::Increase),
    ("increasing", Direction::Increase),
    ("improve", Direction::Increase),
    ("improved", Direction::Increase),
    ("improves", Direction::Increase),
    ("improving", Direction::Increase),
    ("improvement", Direction::Increase),
    ("boost", Direction::Increase),
    ("boosted", Direction::Increase),
    ("boosts", Direction::Increase),
    ("rise", Direction::Increase),
    ("rose", Direction::Increase),
    ("rises", Direction::Increase),
    ("grew", Direction::Increase),
    ("grow", Direction::Increase),
    ("growth", Direction::Increase),
    ("gain", Direction::Increase),
    ("gains", Direction::Increase),
    ("gained", Direction::Increase),
    ("jump", Direction::Increase),
    ("jumped", Direction::Increase),
    ("surge", Direction::Increase),
    ("surged", Direction::Increase),
    ("raise", Direction::Increase),
    ("raised", Direction::Increase),
    ("up", Direction::Increase),
    ("higher", Direction::Increase),
    ("more", Direction::Increase),
    ("faster", Direction::Increase),
    ("quicker", Direction::Increase),
    ("reduce", Direction::Decrease),
    ("reduced", Direction::Decrease),
    ("reduces", Direction::Decrease),
    ("reducing", Direction::Decrease),
    ("reduction", Direction::Decrease),
    ("decrease", Direction::Decrease),
    ("decreased", Direction::Decrease),
    ("decreases", Direction::Decrease),
    ("cut", Direction::Decrease),
    ("cuts", Direction::Decrease),
    ("cutting", Direction::Decrease),
    ("slash", Direction::Decrease),
    ("slashed", Direction::Decrease),
    ("drop", Direction::Decrease),
    ("dropped", Direction::Decrease),
    ("fell", Direction::Decrease),
    ("fall", Direction::Decrease),
    ("decline", Direction::Decrease),
    ("declined", Direction::Decrease),
    ("shrank", Direction::Decrease),
    ("lower", Direction::Decrease),
    ("less", Direction::Decrease),
    ("fewer", Direction::Decrease),
    ("down", Direction::Decrease),
];

/// Words skipped when counting the direction window: `cut time by up to 40%`.
const DIRECTION_FILLERS: &[&str] = &[
    "by", "to", "the", "a", "an", "of", "on", "in", "for", "at", "as", "about", "nearly", "almost",
    "around", "roughly", "approximately", "some", "than", "least", "over", "under",
];

/// Words that frame a duration as time saved rather than a plain duration.
pub const PRODUCTIVITY_FRAMING: &[&str] = &[
    "save", "saves", "saved", "saving", "savings",
    "reduce", "reduces", "reduced", "reducing", "reduction",
    "cut", "cuts", "cutting", "shave", "shaved", "slashed", "trimmed",
    "faster", "quicker", "sooner", "shorter", "less", "fewer",
    "efficiency", "efficient", "efficiencies",
    "productivity", "productive",
    "automate", "automates", "automated", "automating", "automation",
    "free", "frees", "freed", "freeing",
    "streamline", "streamlined", "speed", "sped",
];

/// Productivity-domain vocabulary used by the relevance score.
pub const RELEVANCE_LEXICON: &[&str] = &[
    "productivity", "productive", "efficiency", "efficient", "efficiencies",
    "save", "saves", "saved", "saving", "savings",
    "faster", "quicker", "workload", "burden", "documentation",
    "automate", "automated", "automation", "streamline", "streamlined",
    "adopt", "adopted", "adopting", "adoption",
    "tool", "tools", "ai", "copilot", "assistant", "generative",
    "output", "throughput", "workflow", "workflows",
    "improve", "improved", "improvement",
    "employees", "workers", "staff", "clinicians", "developers", "task", "tasks",
];

/// Negation markers checked within the claim clause.
pub const NEGATIONS: &[&str] = &[
    "not", "no", "without", "never", "neither", "nor", "none", "hardly", "barely", "cannot",
];

/// Sentence openers that point back to a subject in an earlier sentence.
pub const ANAPHORS: &[&str] = &[
    "it", "this", "that", "these", "those", "they", "he", "she", "we", "such", "which", "its",
    "their",
];

/// Function words that do not, on their own, name who made a claim.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "by", "to", "in", "on", "at", "for", "with", "and", "or", "as", "from",
    "about", "nearly", "almost", "around", "roughly", "approximately", "some", "over", "under",
    "than", "per", "is", "was", "were", "are", "be", "been", "has", "have", "had", "it", "this",
    "that", "its", "their", "also", "just", "only", "even", "average", "estimated",
];

pub fn time_unit(word: &str) -> Option<TimeUnit> {
    TIME_UNITS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, unit)| *unit)
}

/// Direction carried by `word`, given the word that follows it.
///
/// `up to` is a hedge, not a direction.
pub fn direction_of(word: &str, next: Option<&str>) -> Option<Direction> {
    if word == "up" && next == Some("to") {
        return None;
    }
    DIRECTION_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, d)| *d)
}

/// Function words and the `up to` hedge, which neither carry a direction
/// nor use up the direction window.
pub fn is_direction_filler(word: &str, next: Option<&str>) -> bool {
    DIRECTION_FILLERS.contains(&word) || (word == "up" && next == Some("to"))
}

pub fn is_framing(word: &str) -> bool {
    PRODUCTIVITY_FRAMING.contains(&word)
}

/// Words that act on a quantity: a direction word or a framing verb.
pub fn is_action(word: &str, next: Option<&str>) -> bool {
    direction_of(word, next).is_some() || is_framing(word)
}

pub fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_to_is_a_hedge() {
        assert_eq!(direction_of("up", Some("to")), None);
        assert_eq!(direction_of("up", Some("from")), Some(Direction::Increase));
        assert_eq!(direction_of("cut", None), Some(Direction::Decrease));
    }

    #[test]
    fn test_direction_fillers() {
        assert!(is_direction_filler("by", Some("30")));
        assert!(is_direction_filler("up", Some("to")));
        assert!(!is_direction_filler("up", Some("from")));
        assert!(!is_direction_filler("reduced", Some("time")));
    }

    #[test]
    fn test_percent_rules_list_longer_phrases_first() {
        let pos = |phrase: &[&str]| PERCENT_RULES.iter().position(|r| r.phrase == phrase).unwrap();
        assert!(pos(&["percentage", "points"][..]) < pos(&["percentage"][..]));
        assert!(pos(&["per", "cent"][..]) < pos(&["percent"][..]));
    }

    #[test]
    fn test_negations_include_contractions() {
        assert!(is_negation("didn't"));
        assert!(is_negation("without"));
        assert!(!is_negation("note"));
    }

    #[test]
    fn test_time_units() {
        assert_eq!(time_unit("hrs"), Some(TimeUnit::Hours));
        assert_eq!(time_unit("weeks"), Some(TimeUnit::Weeks));
        assert_eq!(time_unit("months"), None);
    }
}
