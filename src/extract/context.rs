//! Context extraction: the sentence window that explains a claim.

use super::rules::{self, ANAPHORS, STOPWORDS};
use super::segment::Sentence;
use super::tokenizer::Tokenizer;
use crate::error::ClaimError;
use crate::models::{ClaimCandidate, ContextedClaim, TextSpan};
use tracing::debug;

/// Builds context snippets for candidates.
///
/// The snippet is the sentence holding the claim. When that sentence does not
/// say who or what the claim is about (it opens with "It", "This", "They", or
/// nothing but function words precede the number), the previous sentence is
/// prepended. Snippets never exceed `snippet_max_chars` characters.
#[derive(Debug, Clone)]
pub struct ContextExtractor {
    snippet_max_chars: usize,
}

impl ContextExtractor {
    pub fn new(snippet_max_chars: usize) -> Self {
        Self { snippet_max_chars }
    }

    pub fn extract(
        &self,
        text: &str,
        sentences: &[Sentence],
        candidate: ClaimCandidate,
    ) -> ContextedClaim {
        let anchor = candidate.span_start;
        let found = sentences.iter().position(|s| s.span.contains(anchor));
        let (index, sentence) = match found {
            Some(i) => (Some(i), sentences[i]),
            None => (
                None,
                Sentence {
                    span: line_around(text, anchor),
                    ambiguous: true,
                },
            ),
        };

        let mut window = vec![sentence.span];
        if sentence.ambiguous {
            let error = ClaimError::SentenceBoundaryAmbiguous { offset: anchor };
            debug!(error = %error, "Using the claim sentence only");
        } else if let Some(i) = index.filter(|&i| i > 0) {
            if !subject_resolvable(text, sentence.span, anchor) {
                window.insert(0, sentences[i - 1].span);
            }
        }

        let (mut snippet, mut offset) =
            collapse_with_anchor(text, window[0].start, window[window.len() - 1].end, anchor);
        if window.len() > 1 && snippet.chars().count() > self.snippet_max_chars {
            window = vec![sentence.span];
            (snippet, offset) =
                collapse_with_anchor(text, sentence.span.start, sentence.span.end, anchor);
        }
        if snippet.chars().count() > self.snippet_max_chars {
            let claim_len = candidate.span_end - candidate.span_start;
            (snippet, offset) = trim_around(&snippet, offset, claim_len, self.snippet_max_chars);
        }

        ContextedClaim {
            candidate,
            context_snippet: snippet,
            sentence_boundaries: window,
            claim_offset: offset,
        }
    }
}

/// Whether the words before the claim name a subject.
fn subject_resolvable(text: &str, sentence: TextSpan, anchor: usize) -> bool {
    let lead: Vec<String> = Tokenizer::new(&text[sentence.start..anchor])
        .filter(|t| t.is_word())
        .map(|t| t.lower())
        .collect();

    match lead.first() {
        None => return false,
        Some(first) if ANAPHORS.contains(&first.as_str()) => return false,
        Some(_) => {}
    }

    lead.iter().enumerate().any(|(i, word)| {
        let next = lead.get(i + 1).map(String::as_str);
        word.chars().count() >= 2
            && !STOPWORDS.contains(&word.as_str())
            && !rules::is_action(word, next)
    })
}

/// Whitespace-collapsed `text[start..end]`, and the byte offset of `anchor`
/// inside the result.
fn collapse_with_anchor(text: &str, start: usize, end: usize, anchor: usize) -> (String, usize) {
    let mut out = String::with_capacity(end - start);
    let mut offset = 0;
    let mut pending_space = false;

    for (i, c) in text[start..end].char_indices() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        if start + i == anchor {
            offset = out.len();
        }
        out.push(c);
    }
    (out, offset)
}

/// A word-aligned window of at most `max_chars` characters that keeps the
/// claim at `offset..offset + claim_len` intact.
fn trim_around(
    snippet: &str,
    offset: usize,
    claim_len: usize,
    max_chars: usize,
) -> (String, usize) {
    let bounds: Vec<usize> = snippet
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(snippet.len()))
        .collect();
    let total = bounds.len() - 1;
    let claim_first = bounds.partition_point(|&b| b < offset);
    let claim_last = bounds.partition_point(|&b| b < offset + claim_len).min(total);

    let lead = max_chars / 3;
    let mut first = claim_first.saturating_sub(lead).min(total.saturating_sub(max_chars));
    let mut last = (first + max_chars).min(total);

    if first > 0 {
        if let Some(space) =
            (first..claim_first).find(|&c| snippet[bounds[c]..].starts_with(' '))
        {
            first = space + 1;
        }
    }
    if last < total {
        if let Some(space) = (claim_last..last)
            .rev()
            .find(|&c| snippet[bounds[c]..].starts_with(' '))
        {
            last = space;
        }
    }

    let trimmed = &snippet[bounds[first]..bounds[last]];
    (trimmed.to_string(), offset - bounds[first])
}

/// The line holding `anchor`, for offsets outside every sentence.
fn line_around(text: &str, anchor: usize) -> TextSpan {
    let start = text[..anchor].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[anchor..].find('\n').map(|i| anchor + i).unwrap_or(text.len());
    TextSpan::new(start, end)
}
