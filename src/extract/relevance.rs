//! Relevance scoring for contexted claims.
//!
//! ```text
//! confidence = (0.5 * keywords + 0.3 * proximity + 0.2 * clean_clause) * negation_penalty
//! ```
//!
//! - `keywords`: distinct productivity-lexicon words in the snippet, saturating at two
//! - `proximity`: 1.0 when an action word sits within two tokens of the number,
//!   falling linearly to 0.0 at eight tokens
//! - `clean_clause`: 1.0 when the claim's clause has no negation marker
//! - `negation_penalty`: 0.35 for negated claims, otherwise 1.0
//!
//! Scoring never rejects; the orchestrator applies the threshold.

use super::rules::{self, RELEVANCE_LEXICON};
use super::tokenizer::{Token, Tokenizer};
use crate::models::{ContextedClaim, ScoredClaim};
use std::collections::HashSet;

const KEYWORD_WEIGHT: f64 = 0.5;
const PROXIMITY_WEIGHT: f64 = 0.3;
const CLEAN_CLAUSE_WEIGHT: f64 = 0.2;
const NEGATION_PENALTY: f64 = 0.35;
const KEYWORD_SATURATION: f64 = 2.0;
const PROXIMITY_FULL: usize = 2;
const PROXIMITY_ZERO: usize = 8;

/// Pure scoring function over [`ContextedClaim`]s.
#[derive(Debug, Clone, Default)]
pub struct RelevanceFilter;

impl RelevanceFilter {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, claim: ContextedClaim) -> ScoredClaim {
        let snippet = claim.context_snippet.as_str();
        let tokens: Vec<Token<'_>> = Tokenizer::new(snippet).collect();
        let anchor = tokens.iter().position(|t| t.start == claim.claim_offset);

        let keywords = keyword_score(&tokens);
        let proximity = anchor.map(|a| proximity_score(&tokens, a)).unwrap_or(0.0);
        let negated = match anchor {
            Some(a) => clause_is_negated(&tokens, a),
            None => tokens.iter().any(|t| t.is_word() && rules::is_negation(&t.lower())),
        };

        let mut confidence = KEYWORD_WEIGHT * keywords
            + PROXIMITY_WEIGHT * proximity
            + if negated { 0.0 } else { CLEAN_CLAUSE_WEIGHT };
        if negated {
            confidence *= NEGATION_PENALTY;
        }

        ScoredClaim {
            claim,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

fn keyword_score(tokens: &[Token<'_>]) -> f64 {
    let hits: HashSet<String> = tokens
        .iter()
        .filter(|t| t.is_word())
        .map(|t| t.lower())
        .filter(|w| RELEVANCE_LEXICON.contains(&w.as_str()))
        .collect();
    (hits.len() as f64 / KEYWORD_SATURATION).min(1.0)
}

/// Distance, in words and numbers, from the claim to the nearest action word.
fn proximity_score(tokens: &[Token<'_>], anchor: usize) -> f64 {
    let lexical: Vec<usize> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_lexical() && t.text != "%")
        .map(|(i, _)| i)
        .collect();
    let Some(center) = lexical.iter().position(|&i| i == anchor) else {
        return 0.0;
    };

    let nearest = lexical
        .iter()
        .enumerate()
        .filter(|&(_, &i)| {
            let token = &tokens[i];
            let next = tokens.get(i + 1).map(|t| t.lower());
            token.is_word() && rules::is_action(&token.lower(), next.as_deref())
        })
        .map(|(pos, _)| pos.abs_diff(center))
        .min();

    match nearest {
        None => 0.0,
        Some(d) if d <= PROXIMITY_FULL => 1.0,
        Some(d) if d >= PROXIMITY_ZERO => 0.0,
        Some(d) => (PROXIMITY_ZERO - d) as f64 / (PROXIMITY_ZERO - PROXIMITY_FULL) as f64,
    }
}

fn is_clause_break(token: &Token<'_>) -> bool {
    [',', ';', ':', '(', ')', '.', '!', '?', '\u{2014}', '\u{2013}']
        .iter()
        .any(|&c| token.is_punct(c))
}

fn clause_is_negated(tokens: &[Token<'_>], anchor: usize) -> bool {
    let start = tokens[..anchor]
        .iter()
        .rposition(is_clause_break)
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = tokens[anchor..]
        .iter()
        .position(is_clause_break)
        .map(|i| anchor + i)
        .unwrap_or(tokens.len());

    tokens[start..end]
        .iter()
        .any(|t| t.is_word() && rules::is_negation(&t.lower()))
}
