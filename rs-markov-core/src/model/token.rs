use std::fmt;

use serde::{Deserialize, Serialize};

/// Punctuation marks kept as standalone tokens by the normalizer.
pub const PUNCTUATION: [char; 6] = ['.', ',', ':', ';', '?', '!'];

/// Marks that close a sentence and re-arm capitalization.
pub const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Textual form of the paragraph-break marker in a normalized stream.
pub const PARAGRAPH_MARKER: &str = "#";

/// Returns `true` if `c` belongs to the recognized punctuation set.
pub fn is_punctuation(c: char) -> bool {
	PUNCTUATION.contains(&c)
}

/// A single unit of the normalized token stream.
///
/// Tokens are compared by value; the derived ordering only exists so that
/// successor tables iterate deterministically under a seeded RNG.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
	/// Lowercase word, possibly containing apostrophes.
	Word(String),
	/// One of the marks in [`PUNCTUATION`].
	Punctuation(char),
	/// End of paragraph / hard line break.
	ParagraphBreak,
}

impl Token {
	/// Parses one whitespace-free piece of normalized text.
	pub fn parse(raw: &str) -> Self {
		if raw == PARAGRAPH_MARKER {
			return Token::ParagraphBreak;
		}
		let mut chars = raw.chars();
		match (chars.next(), chars.next()) {
			(Some(c), None) if is_punctuation(c) => Token::Punctuation(c),
			_ => Token::Word(raw.to_owned()),
		}
	}

	/// Shorthand for building a word token.
	pub fn word(word: &str) -> Self {
		Token::Word(word.to_owned())
	}

	/// `. ! ?`
	pub fn is_sentence_end(&self) -> bool {
		matches!(self, Token::Punctuation(c) if SENTENCE_END.contains(c))
	}

	/// Only a literal period opens a starter candidate; `!` and `?` do not.
	pub fn is_starter_trigger(&self) -> bool {
		matches!(self, Token::Punctuation('.'))
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Token::Word(word) => f.write_str(word),
			Token::Punctuation(c) => write!(f, "{c}"),
			Token::ParagraphBreak => f.write_str(PARAGRAPH_MARKER),
		}
	}
}

/// Ordered `(previous, current)` context used to look up successors.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PairKey {
	pub previous: Token,
	pub current: Token,
}

impl PairKey {
	pub fn new(previous: Token, current: Token) -> Self {
		Self { previous, current }
	}
}

/// Joins a token stream back into text that normalizes to the same stream.
///
/// Paragraph breaks become line breaks since a literal `#` would be stripped.
pub fn render(tokens: &[Token]) -> String {
	let mut out = String::new();
	for token in tokens {
		if !out.is_empty() {
			out.push(' ');
		}
		match token {
			Token::ParagraphBreak => out.push('\n'),
			other => out.push_str(&other.to_string()),
		}
	}
	out
}
