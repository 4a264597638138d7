//! Top-level module for the trigram generation system.
//!
//! This module provides:
//! - Normalized token types and pair keys (`Token`, `PairKey`)
//! - The trained statistics and their sampler (`CorpusModel`)
//! - Per-pair weighted successors (`State`)
//! - Generation parameters (`GenerationInput`)
//! - The sentence state machine (`Generator`)

/// Tokens, pair keys, punctuation sets and stream rendering.
pub mod token;

/// Trigram statistics: training, sampling, merging and persistence.
///
/// Supports parallel construction from a folder and `postcard` caching.
pub mod corpus_model;

/// High-level generation of whole sentences from a trained model.
pub mod generator;

/// Generation parameters: minimum length, seed and token cap.
pub mod generation_input;

/// Weighted successor multiset of a single token pair.
///
/// Not exposed publicly.
mod state;

pub use state::State;
