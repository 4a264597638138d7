use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ModelError, Result};
use crate::model::corpus_model::CorpusModel;
use crate::model::generation_input::GenerationInput;
use crate::model::token::Token;

/// One piece of generated output.
#[derive(Debug, PartialEq)]
enum Fragment {
	/// A word, possibly with punctuation glued to its end.
	Text(String),
	ParagraphBreak,
}

/// Ordered output of a single generation run.
#[derive(Debug, Default)]
struct GenerationBuffer {
	fragments: Vec<Fragment>,
}

impl GenerationBuffer {
	fn push_text(&mut self, text: String) {
		self.fragments.push(Fragment::Text(text));
	}

	fn push_break(&mut self) {
		self.fragments.push(Fragment::ParagraphBreak);
	}

	/// Glues a punctuation mark to the previous word, without a space.
	fn attach(&mut self, mark: char) {
		match self.fragments.last_mut() {
			Some(Fragment::Text(text)) => text.push(mark),
			_ => self.fragments.push(Fragment::Text(mark.to_string())),
		}
	}

	/// Joins fragments with single spaces; a paragraph break becomes a line break.
	fn render(&self) -> String {
		let mut out = String::new();
		for fragment in &self.fragments {
			match fragment {
				Fragment::Text(text) => {
					if !out.is_empty() && !out.ends_with('\n') {
						out.push(' ');
					}
					out.push_str(text);
				}
				Fragment::ParagraphBreak => out.push('\n'),
			}
		}
		out
	}
}

/// Uppercases the first character of a token.
fn capitalize(token: &Token) -> String {
	let text = token.to_string();
	let mut chars = text.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

/// Sentence generator driving the sampler of a trained [`CorpusModel`].
///
/// # Responsibilities
/// - Open the text with a starter word and its second word
/// - Walk the trigram chain, capitalizing after sentence ends and paragraph breaks
/// - Glue punctuation to the preceding word
/// - Stop only at a sentence end, once the minimum length is exceeded
///
/// Any failed draw aborts the run; nothing is retried.
#[derive(Debug)]
pub struct Generator<'a> {
	model: &'a CorpusModel,
}

impl<'a> Generator<'a> {
	pub fn new(model: &'a CorpusModel) -> Self {
		Self { model }
	}

	/// Generates text, seeding the RNG from `input.seed` or from the OS.
	pub fn generate(&self, input: &GenerationInput) -> Result<String> {
		let mut rng = match input.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		self.generate_with_rng(input, &mut rng)
	}

	/// Generates text using the caller's RNG.
	///
	/// # Returns
	/// - `Ok(String)`: whole sentences with more than `input.min_length()` tokens
	///   (words, punctuation and paragraph breaks, first two included)
	///
	/// # Errors
	/// - `EmptyModel` / `UnknownTransition` from the sampler
	/// - `TokenLimit` if `input.max_tokens()` is exceeded
	pub fn generate_with_rng<R: Rng>(&self, input: &GenerationInput, rng: &mut R) -> Result<String> {
		let mut buffer = GenerationBuffer::default();

		let first = self.model.draw_starter(rng)?.clone();
		buffer.push_text(capitalize(&first));

		let second = self.model.draw_second(&first, rng)?.clone();
		let mut is_starter = match &second {
			Token::ParagraphBreak => {
				buffer.push_break();
				true
			}
			Token::Punctuation(mark) => {
				buffer.attach(*mark);
				second.is_sentence_end()
			}
			Token::Word(word) => {
				buffer.push_text(word.clone());
				false
			}
		};

		let (mut previous, mut current) = (first, second);
		let mut drawn = 2;

		loop {
			// One sentence
			loop {
				let next = self.model.draw_next(&previous, &current, rng)?.clone();
				drawn += 1;
				if let Some(limit) = input.max_tokens() {
					if drawn > limit {
						return Err(ModelError::TokenLimit { limit });
					}
				}

				let sentence_done = match &next {
					Token::ParagraphBreak => {
						is_starter = true;
						buffer.push_break();
						false
					}
					Token::Punctuation(mark) => {
						buffer.attach(*mark);
						if next.is_sentence_end() {
							is_starter = true;
						}
						next.is_sentence_end()
					}
					Token::Word(word) => {
						if is_starter {
							is_starter = false;
							buffer.push_text(capitalize(&next));
						} else {
							buffer.push_text(word.clone());
						}
						false
					}
				};

				previous = std::mem::replace(&mut current, next);
				if sentence_done {
					break;
				}
			}

			if drawn > input.min_length() {
				break;
			}
		}

		debug!("Generated {drawn} tokens in {} fragments", buffer.fragments.len());
		Ok(buffer.render())
	}
}

impl CorpusModel {
	/// Generates at least `min_length` tokens of whole sentences with an
	/// OS-seeded RNG.
	pub fn generate(&self, min_length: usize) -> Result<String> {
		Generator::new(self).generate(&GenerationInput::new(min_length))
	}
}
