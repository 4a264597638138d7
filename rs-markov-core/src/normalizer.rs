//! Raw prose to canonical token stream.
//!
//! The pipeline runs in a fixed order:
//! 1. typographic folding (curly apostrophes, ellipsis, CRLF)
//! 2. quote disambiguation (apostrophe vs quotation mark)
//! 3. case folding
//! 4. punctuation separation
//! 5. symbol stripping
//! 6. paragraph collapsing
//! 7. whitespace tokenization
//!
//! Normalization never fails: unrecognized symbols simply vanish.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::token::{is_punctuation, Token, PARAGRAPH_MARKER};

/// Replacement for a single quote used as a quotation delimiter.
/// Dropped later by symbol stripping.
const QUOTE_MARKER: char = '"';

/// Anything that is not a letter, whitespace, apostrophe or recognized punctuation.
/// Letters are `char::is_alphabetic`, the same set the neighbour checks use.
static SYMBOLS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\s'.,:;?!]+").expect("symbol pattern is valid"));

static LINE_BREAKS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\n+").expect("line break pattern is valid"));

/// Normalizes a raw document into its token stream.
pub fn normalize(raw: &str) -> Vec<Token> {
	normalize_text(raw).split_whitespace().map(Token::parse).collect()
}

/// Runs every normalization step except the final split.
pub fn normalize_text(raw: &str) -> String {
	let text = separate_quotes(&fold_typography(raw)).to_lowercase();
	let text = separate_punctuation(&text);
	let text = SYMBOLS.replace_all(&text, "");
	LINE_BREAKS
		.replace_all(&text, format!(" {PARAGRAPH_MARKER} ").as_str())
		.into_owned()
}

/// Folds typographic variants onto the plain characters the pipeline knows.
fn fold_typography(text: &str) -> String {
	text.replace("\r\n", "\n")
		.chars()
		.map(|c| match c {
			'\r' => '\n',
			'\u{2018}' | '\u{2019}' => '\'',
			'\u{2026}' => ' ',
			other => other,
		})
		.collect()
}

/// Rewrites quotation-mark single quotes to [`QUOTE_MARKER`].
///
/// A quote is an apostrophe only when both its direct neighbours are letters;
/// digits, the start and the end of the text do not count since none of them
/// survive symbol stripping.
/// A quote right after `.` or `,` is folded into that mark first.
fn separate_quotes(text: &str) -> String {
	let text = text.replace(".'", ".").replace(",'", ",");
	let chars: Vec<char> = text.chars().collect();

	chars
		.iter()
		.enumerate()
		.map(|(i, &c)| {
			if c != '\'' {
				return c;
			}
			let before = i.checked_sub(1).and_then(|j| chars.get(j));
			let after = chars.get(i + 1);
			if before.is_some_and(|b| b.is_alphabetic()) && after.is_some_and(|a| a.is_alphabetic()) {
				c
			} else {
				QUOTE_MARKER
			}
		})
		.collect()
}

/// Inserts a space before every recognized mark not followed by a letter
/// (end of text included).
fn separate_punctuation(text: &str) -> String {
	let chars: Vec<char> = text.chars().collect();
	let mut out = String::with_capacity(text.len() + text.len() / 8);

	for (i, &c) in chars.iter().enumerate() {
		if is_punctuation(c) && !chars.get(i + 1).is_some_and(|next| next.is_alphabetic()) {
			out.push(' ');
		}
		out.push(c);
	}

	out
}
