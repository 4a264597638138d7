use crate::error::{ModelError, Result};

/// Parameters of one generation run.
///
/// # Responsibilities
/// - Track the minimum length and the optional RNG seed
/// - Hold an optional hard cap on drawn tokens, validated against `min_length`
///
/// # Invariants
/// - When set, `max_tokens` is strictly greater than `min_length`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationInput {
	/// Generation stops after the first sentence ending once more than
	/// this many tokens (words, punctuation and paragraph breaks) were drawn.
	min_length: usize,

	/// Seed for a reproducible run. `None` seeds from the OS.
	pub seed: Option<u64>,

	/// Hard cap on drawn tokens. `None` lets a sentence run as long as it needs.
	max_tokens: Option<usize>,
}

impl GenerationInput {
	/// Creates an input with the given minimum length, no seed and no cap.
	pub fn new(min_length: usize) -> Self {
		Self { min_length, ..Self::default() }
	}

	pub fn min_length(&self) -> usize {
		self.min_length
	}

	pub fn max_tokens(&self) -> Option<usize> {
		self.max_tokens
	}

	/// Sets the minimum length.
	///
	/// # Errors
	/// Returns an error if a cap is set and `min_length` is not below it.
	pub fn set_min_length(&mut self, min_length: usize) -> Result<()> {
		Self::check(min_length, self.max_tokens)?;
		self.min_length = min_length;
		Ok(())
	}

	/// Sets (or removes) the token cap.
	///
	/// # Errors
	/// Returns an error if the cap does not exceed `min_length`.
	pub fn set_max_tokens(&mut self, max_tokens: Option<usize>) -> Result<()> {
		Self::check(self.min_length, max_tokens)?;
		self.max_tokens = max_tokens;
		Ok(())
	}

	fn check(min_length: usize, max_tokens: Option<usize>) -> Result<()> {
		match max_tokens {
			Some(limit) if limit <= min_length => Err(ModelError::InvalidInput(format!(
				"max_tokens ({limit}) must be greater than min_length ({min_length})"
			))),
			_ => Ok(()),
		}
	}
}
