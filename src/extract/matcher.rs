//! Claim matching: finds percentage and time-saved quantities in text.
//!
//! The matcher walks the token stream and, at every number, tries the rule
//! tables in [`rules`](super::rules):
//!
//! | Shape | Example | Unit |
//! |-------|---------|------|
//! | number + percent marker | `25%`, `25-percent`, `25 per cent` | `Percent` |
//! | number + points marker | `5 percentage points`, `5 pp` | `PercentagePoints` |
//! | number + time unit | `3 hours`, `30-minute`, `2 more days` | `Time(..)` |
//!
//! Time units only count when the sentence also carries productivity framing
//! (`saved`, `faster`, `efficiency`, ...). A number that fits more than one
//! shape, or more than one unit, yields one candidate per reading; the
//! pipeline keeps the reading the relevance score prefers.

use super::rules::{self, PERCENT_RULES, TIME_MODIFIERS};
use super::segment::{Segmenter, Sentence};
use super::tokenizer::{Token, TokenKind, Tokenizer, parse_number};
use crate::error::ClaimError;
use crate::models::{ClaimCandidate, Direction, TextSpan, Unit};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Words before the number searched for a direction word.
const DIRECTION_LOOKBEHIND: usize = 4;
/// Words after the unit searched for a direction word.
const DIRECTION_LOOKAHEAD: usize = 3;

/// Scans cleaned text for quantitative claim candidates.
#[derive(Debug, Clone)]
pub struct ClaimMatcher {
    percent_ceiling: f64,
    segmenter: Arc<dyn Segmenter>,
}

impl ClaimMatcher {
    pub fn new(percent_ceiling: f64, segmenter: Arc<dyn Segmenter>) -> Self {
        Self {
            percent_ceiling,
            segmenter,
        }
    }

    /// Candidates in `text`, segmenting it first.
    pub fn scan<'a>(&self, text: &'a str) -> Candidates<'a> {
        let sentences = self.segmenter.segment(text);
        Candidates::new(text, sentences, self.percent_ceiling)
    }

    /// Candidates in `text` using sentences the caller already computed.
    pub fn scan_with<'a>(&self, text: &'a str, sentences: &[Sentence]) -> Candidates<'a> {
        Candidates::new(text, sentences.to_vec(), self.percent_ceiling)
    }
}

/// Lazy, finite sequence of candidates over one text.
///
/// A clone continues from the same position. Calling [`ClaimMatcher::scan`]
/// again yields the same sequence from the start.
#[derive(Debug, Clone)]
pub struct Candidates<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    sentences: Vec<Sentence>,
    /// Token index range `[start, end)` for each sentence.
    sentence_tokens: Vec<(usize, usize)>,
    framed: Vec<Option<bool>>,
    percent_ceiling: f64,
    cursor: usize,
    pending: VecDeque<ClaimCandidate>,
}

impl<'a> Candidates<'a> {
    fn new(text: &'a str, sentences: Vec<Sentence>, percent_ceiling: f64) -> Self {
        let tokens: Vec<Token<'a>> = Tokenizer::new(text).collect();
        let sentence_tokens = sentences
            .iter()
            .map(|s| {
                let start = tokens.partition_point(|t| t.start < s.span.start);
                let end = tokens.partition_point(|t| t.start < s.span.end);
                (start, end)
            })
            .collect();
        let framed = vec![None; sentences.len()];

        Self {
            text,
            tokens,
            sentences,
            sentence_tokens,
            framed,
            percent_ceiling,
            cursor: 0,
            pending: VecDeque::new(),
        }
    }

    /// Token range of the sentence holding token `idx`; the whole text when
    /// the token falls outside every sentence.
    fn sentence_of(&self, idx: usize) -> (Option<usize>, (usize, usize)) {
        let offset = self.tokens[idx].start;
        let found = self
            .sentences
            .iter()
            .position(|s| s.span.contains(offset));
        match found {
            Some(si) => (Some(si), self.sentence_tokens[si]),
            None => (None, (0, self.tokens.len())),
        }
    }

    fn sentence_is_framed(&mut self, sentence: Option<usize>, range: (usize, usize)) -> bool {
        if let Some(si) = sentence {
            if let Some(cached) = self.framed[si] {
                return cached;
            }
        }
        let framed = self.tokens[range.0..range.1]
            .iter()
            .filter(|t| t.is_word())
            .any(|t| rules::is_framing(&t.lower()));
        if let Some(si) = sentence {
            self.framed[si] = Some(framed);
        }
        framed
    }

    /// Index of the first token after `idx`, stepping over one hyphen.
    fn after_number(&self, idx: usize, limit: usize) -> usize {
        let next = idx + 1;
        if next < limit && self.tokens[next].is_punct('-') {
            next + 1
        } else {
            next
        }
    }

    /// Every distinct percent-like reading at `idx`, longest phrase first
    /// within each unit.
    fn match_percent(&self, idx: usize, limit: usize) -> Vec<(Unit, usize)> {
        let first = self.after_number(idx, limit);
        let mut found: Vec<(Unit, usize)> = Vec::new();
        for rule in PERCENT_RULES {
            let end = first + rule.phrase.len();
            if end > limit || found.iter().any(|(unit, _)| *unit == rule.unit) {
                continue;
            }
            let matched = self.tokens[first..end]
                .iter()
                .zip(rule.phrase)
                .all(|(token, word)| token.lower() == *word);
            if matched {
                found.push((rule.unit, end - 1));
            }
        }
        found
    }

    fn match_time(&self, idx: usize, limit: usize) -> Option<(Unit, usize)> {
        let mut at = self.after_number(idx, limit);
        for _ in 0..2 {
            let token = self.tokens.get(at).filter(|_| at < limit)?;
            if !token.is_word() {
                return None;
            }
            let word = token.lower();
            if let Some(unit) = rules::time_unit(&word) {
                return Some((Unit::Time(unit), at));
            }
            if !TIME_MODIFIERS.contains(&word.as_str()) {
                return None;
            }
            at += 1;
        }
        None
    }

    /// Nearest direction word to the claim within the sentence; preceding
    /// words win ties. Fillers such as `by` and `up to` are not counted.
    fn direction(&self, number_idx: usize, unit_idx: usize, range: (usize, usize)) -> Direction {
        let next_of = |i: usize| self.tokens.get(i + 1).map(|t| t.lower());
        let words = |from: usize, to: usize| {
            (from..to)
                .filter(|&i| self.tokens[i].is_word())
                .filter(|&i| {
                    let word = self.tokens[i].lower();
                    !rules::is_direction_filler(&word, next_of(i).as_deref())
                })
                .collect::<Vec<_>>()
        };

        let before = words(range.0, number_idx);
        let after = words(unit_idx + 1, range.1);
        let behind = before.iter().rev().take(DIRECTION_LOOKBEHIND);
        let ahead = after.iter().take(DIRECTION_LOOKAHEAD);

        let lookup = |i: usize| rules::direction_of(&self.tokens[i].lower(), next_of(i).as_deref());

        let mut best: Option<(usize, Direction)> = None;
        for (distance, &i) in behind.enumerate() {
            if let Some(d) = lookup(i) {
                best = Some((distance, d));
                break;
            }
        }
        for (distance, &i) in ahead.enumerate() {
            if best.is_some_and(|(b, _)| b <= distance) {
                break;
            }
            if let Some(d) = lookup(i) {
                best = Some((distance, d));
                break;
            }
        }
        best.map(|(_, d)| d).unwrap_or(Direction::Unspecified)
    }

    fn candidate(
        &self,
        number_idx: usize,
        unit_idx: usize,
        quantity: f64,
        unit: Unit,
        direction: Direction,
    ) -> ClaimCandidate {
        let span = TextSpan::new(self.tokens[number_idx].start, self.tokens[unit_idx].end);
        ClaimCandidate {
            span_start: span.start,
            span_end: span.end,
            raw_text: span.slice(self.text).to_string(),
            quantity,
            unit,
            direction,
        }
    }

    fn match_at(&mut self, idx: usize) {
        let token = self.tokens[idx];
        let Some(quantity) = parse_number(token.text) else {
            let error = ClaimError::MalformedNumericToken {
                token: token.text.to_string(),
                offset: token.start,
            };
            debug!(error = %error, "Skipping malformed number");
            return;
        };

        let (sentence, range) = self.sentence_of(idx);

        for (unit, end) in self.match_percent(idx, range.1) {
            if unit.is_percent_like() && quantity > self.percent_ceiling {
                debug!(
                    quantity,
                    ceiling = self.percent_ceiling,
                    "Percentage above ceiling; dropped"
                );
                continue;
            }
            let direction = self.direction(idx, end, range);
            let candidate = self.candidate(idx, end, quantity, unit, direction);
            self.pending.push_back(candidate);
        }

        if let Some((unit, end)) = self.match_time(idx, range.1) {
            if self.sentence_is_framed(sentence, range) {
                let direction = self.direction(idx, end, range);
                let candidate = self.candidate(idx, end, quantity, unit, direction);
                self.pending.push_back(candidate);
            }
        }
    }
}

impl Iterator for Candidates<'_> {
    type Item = ClaimCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(candidate) = self.pending.pop_front() {
                return Some(candidate);
            }
            if self.cursor >= self.tokens.len() {
                return None;
            }
            let idx = self.cursor;
            self.cursor += 1;
            if self.tokens[idx].kind == TokenKind::Number {
                self.match_at(idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::segment::RuleSegmenter;
    use crate::models::TimeUnit;

    fn matcher() -> ClaimMatcher {
        ClaimMatcher::new(1000.0, Arc::new(RuleSegmenter::new()))
    }

    fn scan(text: &str) -> Vec<ClaimCandidate> {
        matcher().scan(text).collect()
    }

    #[test]
    fn test_increased_productivity_by_percent() {
        let found = scan("The rollout increased productivity by 25% across teams.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].quantity, 25.0);
        assert_eq!(found[0].unit, Unit::Percent);
        assert_eq!(found[0].direction, Direction::Increase);
        assert_eq!(found[0].raw_text, "25%");
    }

    #[test]
    fn test_time_saved_claim() {
        let text = "Company X reported saving 3 hours per week after adopting the tool.";
        let found = scan(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].quantity, 3.0);
        assert_eq!(found[0].unit, Unit::Time(TimeUnit::Hours));
        assert_eq!(found[0].direction, Direction::Unspecified);
        assert_eq!(&text[found[0].span_start..found[0].span_end], "3 hours");
    }

    #[test]
    fn test_plain_duration_is_not_a_claim() {
        assert!(scan("The meeting lasted 3 hours and ended at noon.").is_empty());
    }

    #[test]
    fn test_framing_must_share_the_sentence() {
        let text = "The tool saved money. The meeting lasted 3 hours.";
        assert!(scan(text).is_empty());
    }

    #[test]
    fn test_percent_marker_variants() {
        let found = scan(
            "Costs fell 12 percent, then 7 per cent, then a 5-percent dip \
             and 3 percentage points more.",
        );
        let units: Vec<_> = found.iter().map(|c| (c.quantity, c.unit)).collect();
        assert_eq!(
            units,
            vec![
                (12.0, Unit::Percent),
                (7.0, Unit::Percent),
                (5.0, Unit::Percent),
                (3.0, Unit::PercentagePoints),
                (3.0, Unit::Percent),
            ]
        );
    }

    #[test]
    fn test_both_unit_readings_are_kept() {
        let text = "Approval rose 5 percentage points this year.";
        let found = scan(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].unit, Unit::PercentagePoints);
        assert_eq!(found[0].raw_text, "5 percentage points");
        assert_eq!(found[1].unit, Unit::Percent);
        assert_eq!(found[1].raw_text, "5 percentage");
        assert_eq!(found[0].span_start, found[1].span_start);
        assert!(found[1].span_end <= found[0].span_end);
        assert!(found.iter().all(|c| c.direction == Direction::Increase));
    }

    #[test]
    fn test_direction_skips_fillers_and_hedges() {
        let cases = [
            ("The tool increased productivity by up to 25%.", 25.0, Direction::Increase),
            ("It cut drafting time by up to 40%.", 40.0, Direction::Decrease),
            ("Nurses reduced time spent on charting by 30%.", 30.0, Direction::Decrease),
        ];
        for (text, quantity, direction) in cases {
            let found = scan(text);
            assert_eq!(found.len(), 1, "{text}");
            assert_eq!(found[0].quantity, quantity);
            assert_eq!(found[0].direction, direction, "{text}");
        }
    }

    #[test]
    fn test_decrease_direction_after_number() {
        let found = scan("Drafting took 40% less time with the assistant.");
        assert_eq!(found[0].direction, Direction::Decrease);
    }

    #[test]
    fn test_up_to_is_not_an_increase() {
        let found = scan("Vendors promise up to 50% on some tasks.");
        assert_eq!(found[0].direction, Direction::Unspecified);
    }

    #[test]
    fn test_ceiling_drops_implausible_percentages() {
        assert!(scan("Productivity increased by 1500% after adoption.").is_empty());
        let lenient = ClaimMatcher::new(2000.0, Arc::new(RuleSegmenter::new()));
        assert_eq!(lenient.scan("Productivity increased by 1500% after adoption.").count(), 1);
    }

    #[test]
    fn test_malformed_numbers_are_skipped() {
        let found = scan("Version 1.2.3 cut review time by 30%.");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].quantity, 30.0);
    }

    #[test]
    fn test_hyphenated_time_unit_with_modifier() {
        let found = scan("Automation freed up a 2-hour block and 3 more days each quarter.");
        let units: Vec<_> = found.iter().map(|c| (c.quantity, c.unit)).collect();
        assert_eq!(
            units,
            vec![(2.0, Unit::Time(TimeUnit::Hours)), (3.0, Unit::Time(TimeUnit::Days))]
        );
    }

    #[test]
    fn test_scan_is_restartable() {
        let m = matcher();
        let text = "Teams saved 5 hours and cut costs 10%.";
        let first: Vec<_> = m.scan(text).collect();
        let second: Vec<_> = m.scan(text).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(scan("").is_empty());
    }
}
