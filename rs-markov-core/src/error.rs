use thiserror::Error;

use crate::model::token::Token;

/// Errors raised while training, persisting or sampling a corpus model.
///
/// Sampling errors (`EmptyModel`, `UnknownTransition`) are never retried:
/// a failed draw aborts the whole generation run.
#[derive(Debug, Error)]
pub enum ModelError {
	/// The starter list is empty, so no sentence can be opened.
	#[error("model is empty: no sentence starter was observed during training")]
	EmptyModel,

	/// The pair `(previous, current)` was never observed during training.
	#[error("no transition observed after ({previous}, {current})")]
	UnknownTransition { previous: Token, current: Token },

	/// Generation drew more tokens than the configured cap without finishing a sentence.
	#[error("generation exceeded {limit} tokens without completing a sentence")]
	TokenLimit { limit: usize },

	/// A training worker died before returning its share of the corpus.
	#[error("training incomplete: {received} of {expected} corpus chunks were processed")]
	IncompleteTraining { expected: usize, received: usize },

	/// A generation parameter is out of range.
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Serialization(#[from] postcard::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
