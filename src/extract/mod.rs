//! The text side of the engine: from cleaned article text to scored claims.
//!
//! # Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Sentence segmentation | [`segment`] | [`Sentence`] spans |
//! | Claim matching | [`matcher`] | [`ClaimCandidate`](crate::models::ClaimCandidate) |
//! | Context extraction | [`context`] | [`ContextedClaim`](crate::models::ContextedClaim) |
//! | Relevance scoring | [`relevance`] | [`ScoredClaim`](crate::models::ScoredClaim) |
//!
//! Every stage is synchronous and free of I/O; the same input always gives
//! the same output.

pub mod context;
pub mod matcher;
pub mod relevance;
pub mod rules;
pub mod segment;
pub mod tokenizer;

pub use context::ContextExtractor;
pub use matcher::{Candidates, ClaimMatcher};
pub use relevance::RelevanceFilter;
pub use segment::{RuleSegmenter, Segmenter, Sentence};
