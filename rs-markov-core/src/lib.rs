//! Trigram Markov text generation library.
//!
//! This crate turns a corpus of prose into second-order Markov statistics
//! and samples new text that mimics it:
//! - A normalizer producing lowercase word, punctuation and paragraph tokens
//! - A corpus model counting successors of every token pair
//! - A generator rebuilding capitalization and punctuation spacing
//!
//! ```no_run
//! use rs_markov_core::model::corpus_model::CorpusModel;
//!
//! let mut model = CorpusModel::new();
//! model.add_document("The cat sat. The dog ran.");
//! println!("{}", model.generate(3)?);
//! # Ok::<(), rs_markov_core::error::ModelError>(())
//! ```

/// Error taxonomy shared by training, persistence and generation.
pub mod error;

/// Core trigram model and generation logic.
pub mod model;

/// Raw text to token stream.
pub mod normalizer;

/// I/O utilities (document loading, folder walking).
///
/// Not exposed
pub(crate) mod io;
