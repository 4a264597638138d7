use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::token::Token;

/// Weighted successor multiset of one `(previous, current)` pair.
///
/// Conceptually a node of the trigram Markov chain: each outgoing edge is a
/// successor token weighted by the number of times it was observed after
/// the pair.
///
/// ## Invariants
/// - Every occurrence count is strictly positive
/// - A state only exists once at least one successor was observed
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct State {
	/// Successor token to observation count.
	/// Example: { "sat" => 3, "ran" => 1 }
	successors: BTreeMap<Token, usize>,
}

impl State {
	/// Records one more occurrence of `next` after this pair.
	pub fn add_transition(&mut self, next: Token) {
		*self.successors.entry(next).or_insert(0) += 1;
	}

	/// Total number of observations (sum of all counts).
	pub fn total(&self) -> usize {
		self.successors.values().sum()
	}

	/// Occurrence count of a given successor, 0 if never observed.
	pub fn count(&self, next: &Token) -> usize {
		self.successors.get(next).copied().unwrap_or(0)
	}

	/// Iterates over `(successor, count)` pairs in token order.
	pub fn successors(&self) -> impl Iterator<Item = (&Token, usize)> {
		self.successors.iter().map(|(token, count)| (token, *count))
	}

	/// Draws a successor with probability proportional to its count.
	///
	/// Equivalent to picking a uniform index in the list where every
	/// successor is repeated `count` times, without building that list.
	///
	/// Returns `None` if the state has no transitions.
	pub fn predict<R: Rng>(&self, rng: &mut R) -> Option<&Token> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut r = rng.random_range(0..total);
		for (next, occurrence) in &self.successors {
			if r < *occurrence {
				return Some(next);
			}
			r -= occurrence;
		}

		// Unreachable while counts sum to `total`
		None
	}

	/// Adds every count of `other` into this state.
	pub fn merge(&mut self, other: &Self) {
		for (next, occurrence) in &other.successors {
			*self.successors.entry(next.clone()).or_insert(0) += *occurrence;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_empty_state_predicts_nothing() {
		let state = State::default();
		assert_eq!(state.predict(&mut StdRng::seed_from_u64(1)), None);
	}

	#[test]
	fn test_counts() {
		let mut state = State::default();
		state.add_transition(Token::word("a"));
		state.add_transition(Token::word("a"));
		state.add_transition(Token::Punctuation('.'));
		assert_eq!(state.total(), 3);
		assert_eq!(state.count(&Token::word("a")), 2);
		assert_eq!(state.count(&Token::word("b")), 0);
	}

	#[test]
	fn test_weighted_sampling_converges_to_counts() {
		let mut state = State::default();
		for _ in 0..3 {
			state.add_transition(Token::word("a"));
		}
		state.add_transition(Token::word("b"));

		let mut rng = StdRng::seed_from_u64(42);
		let trials = 40_000;
		let a = Token::word("a");
		let hits = (0..trials).filter(|_| state.predict(&mut rng) == Some(&a)).count();
		let ratio = hits as f64 / trials as f64;
		assert!((ratio - 0.75).abs() < 0.02, "ratio was {ratio}");
	}

	#[test]
	fn test_merge_sums_counts() {
		let mut left = State::default();
		left.add_transition(Token::word("a"));
		let mut right = State::default();
		right.add_transition(Token::word("a"));
		right.add_transition(Token::word("b"));

		left.merge(&right);
		assert_eq!(left.count(&Token::word("a")), 2);
		assert_eq!(left.count(&Token::word("b")), 1);
		assert_eq!(left.total(), 3);
	}
}
