//! Sentence segmentation.
//!
//! Matching and context extraction only depend on [`Segmenter`], so a
//! model-backed splitter can replace [`RuleSegmenter`] without touching
//! either. Sentences are returned as byte spans into the original text, in
//! order and non-overlapping.

use crate::models::TextSpan;
use std::fmt;

/// One sentence of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence {
    /// Trimmed span of the sentence in the source text.
    pub span: TextSpan,
    /// Set when a period inside the sentence might also have ended it,
    /// e.g. `... in the U.S. Officials said ...`.
    pub ambiguous: bool,
}

/// Splits text into sentences.
pub trait Segmenter: Send + Sync + fmt::Debug {
    fn segment(&self, text: &str) -> Vec<Sentence>;
}

/// Abbreviations that may also end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "inc", "corp", "ltd", "co", "llc", "plc", "u.s", "u.k", "u.n",
    "e.u", "a.m", "p.m", "approx", "est", "fig", "jan", "feb", "mar", "apr", "jun", "jul", "aug",
    "sep", "sept", "oct", "nov", "dec", "pp",
];

/// Abbreviations that never end a sentence.
const TITLES: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "st", "sen", "rep", "gov", "gen", "col", "lt", "sgt", "capt",
    "jr", "sr", "rev", "hon", "pres", "no", "vol",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Split,
    Ambiguous,
    None,
}

/// Punctuation-driven splitter with abbreviation and decimal exceptions.
///
/// Blank lines always end a sentence. Within a paragraph, `.`, `!`, `?` and
/// `…` end a sentence when followed by whitespace and a character that can
/// start one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSegmenter;

impl RuleSegmenter {
    pub fn new() -> Self {
        Self
    }

    fn segment_block(&self, text: &str, block: TextSpan, out: &mut Vec<Sentence>) {
        let chars: Vec<(usize, char)> = block
            .slice(text)
            .char_indices()
            .map(|(i, c)| (i + block.start, c))
            .collect();

        let mut sentence_start = block.start;
        let mut ambiguous = false;
        let mut i = 0;

        while i < chars.len() {
            let (pos, c) = chars[i];
            if !is_terminal(c) {
                i += 1;
                continue;
            }

            // `2.5`, `U.S`, `example.com`
            let attached = chars
                .get(i + 1)
                .is_some_and(|&(_, n)| !n.is_whitespace() && !is_terminal(n) && !is_closer(n));
            if c == '.' && attached {
                i += 1;
                continue;
            }

            let mut j = i + 1;
            while j < chars.len() && (is_terminal(chars[j].1) || is_closer(chars[j].1)) {
                j += 1;
            }
            let end = chars.get(j).map(|&(p, _)| p).unwrap_or(block.end);

            let mut k = j;
            while k < chars.len() && chars[k].1.is_whitespace() {
                k += 1;
            }
            if k == chars.len() {
                break;
            }
            if k == j {
                i = j;
                continue;
            }

            let next = chars[k].1;
            let decision = if c == '.' {
                classify_period(&text[sentence_start..pos], next)
            } else if next.is_lowercase() {
                Boundary::None
            } else {
                Boundary::Split
            };

            match decision {
                Boundary::Split => {
                    push_trimmed(text, sentence_start, end, ambiguous, out);
                    sentence_start = chars[k].0;
                    ambiguous = false;
                }
                Boundary::Ambiguous => ambiguous = true,
                Boundary::None => {}
            }
            i = k;
        }

        push_trimmed(text, sentence_start, block.end, ambiguous, out);
    }
}

impl Segmenter for RuleSegmenter {
    fn segment(&self, text: &str) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        for block in paragraphs(text) {
            self.segment_block(text, block, &mut sentences);
        }
        sentences
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{2026}')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

fn classify_period(before: &str, next: char) -> Boundary {
    let word = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    let lower = word.to_lowercase();

    if TITLES.contains(&lower.as_str()) {
        return Boundary::None;
    }
    let abbreviation = ABBREVIATIONS.contains(&lower.as_str())
        || is_initial(word)
        || is_dotted_acronym(word);
    if abbreviation {
        return if next.is_uppercase() {
            Boundary::Ambiguous
        } else {
            Boundary::None
        };
    }
    if next.is_lowercase() {
        return Boundary::Ambiguous;
    }
    Boundary::Split
}

fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

fn is_dotted_acronym(word: &str) -> bool {
    word.contains('.')
        && word
            .split('.')
            .all(|part| {
                !part.is_empty() && part.len() <= 2 && part.chars().all(char::is_alphabetic)
            })
}

/// Paragraph spans, separated by lines that are empty or whitespace-only.
fn paragraphs(text: &str) -> Vec<TextSpan> {
    let mut blocks = Vec::new();
    let mut current: Option<TextSpan> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_end = offset + line.len();
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
        } else {
            match current.as_mut() {
                Some(block) => block.end = line_end,
                None => current = Some(TextSpan::new(offset, line_end)),
            }
        }
        offset = line_end;
    }
    if let Some(block) = current {
        blocks.push(block);
    }
    blocks
}

fn push_trimmed(text: &str, start: usize, end: usize, ambiguous: bool, out: &mut Vec<Sentence>) {
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let span_start = start + leading;
    out.push(Sentence {
        span: TextSpan::new(span_start, span_start + trimmed.len()),
        ambiguous,
    });
}
