use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::State;
use super::token::{PairKey, Token};
use crate::error::{ModelError, Result};
use crate::io::{list_files_recursive, normalize_folder, read_document};
use crate::normalizer::normalize;

/// Second-order (trigram) Markov model over normalized tokens.
///
/// # Responsibilities
/// - Accumulate trigram statistics from token streams, one document at a time
/// - Collect sentence starters (tokens that follow a literal period)
/// - Sample starters and successors by observed frequency
/// - Merge with another model (parallel training) and persist to disk
///
/// # Invariants
/// - Every state in `transitions` holds at least one observation
/// - `starters` keeps duplicates, so frequency weights the uniform draw
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CorpusModel {
	/// Tokens observed right after a `.` token, in observation order.
	starters: Vec<Token>,

	/// `(previous, current)` to weighted successors.
	transitions: HashMap<PairKey, State>,
}

impl CorpusModel {
	/// Creates an empty model.
	pub fn new() -> Self {
		Self::default()
	}

	/// Normalizes a raw document and accumulates its statistics.
	pub fn add_document(&mut self, text: &str) {
		let tokens = normalize(text);
		debug!("Observing document with {} tokens", tokens.len());
		self.observe(&tokens);
	}

	/// Accumulates statistics from one token stream.
	///
	/// Every window `(u, v, w)` counts `w` after `(u, v)`; a window whose `u`
	/// is a period and whose `v` is not a paragraph break also records `v`
	/// as a starter. Streams shorter than 3 tokens contribute nothing.
	pub fn observe(&mut self, tokens: &[Token]) {
		for window in tokens.windows(3) {
			let (u, v, w) = (&window[0], &window[1], &window[2]);

			self.transitions
				.entry(PairKey::new(u.clone(), v.clone()))
				.or_default()
				.add_transition(w.clone());

			if u.is_starter_trigger() && *v != Token::ParagraphBreak {
				self.starters.push(v.clone());
			}
		}
	}

	/// Drops every accumulated statistic.
	pub fn clear(&mut self) {
		self.starters.clear();
		self.transitions.clear();
	}

	/// Returns `true` if nothing has been observed yet.
	pub fn is_empty(&self) -> bool {
		self.starters.is_empty() && self.transitions.is_empty()
	}

	/// Sentence starters in observation order (duplicates included).
	pub fn starters(&self) -> &[Token] {
		&self.starters
	}

	/// Number of distinct `(previous, current)` pairs.
	pub fn transition_len(&self) -> usize {
		self.transitions.len()
	}

	/// Sum of every successor count, i.e. the number of trigram windows seen.
	pub fn observation_count(&self) -> usize {
		self.transitions.values().map(State::total).sum()
	}

	/// Weighted successors of a pair, if it was ever observed.
	pub fn successors(&self, previous: &Token, current: &Token) -> Option<&State> {
		self.transitions
			.get(&PairKey::new(previous.clone(), current.clone()))
	}

	/// Draws a uniformly random sentence starter.
	///
	/// # Errors
	/// `EmptyModel` if no starter was ever observed.
	pub fn draw_starter<R: Rng>(&self, rng: &mut R) -> Result<&Token> {
		if self.starters.is_empty() {
			return Err(ModelError::EmptyModel);
		}
		let i = rng.random_range(0..self.starters.len());
		Ok(&self.starters[i])
	}

	/// Draws the token following a sentence opened by `first`.
	///
	/// Looks up the pair `(".", first)`.
	///
	/// # Errors
	/// `UnknownTransition` if `first` never followed a period.
	pub fn draw_second<R: Rng>(&self, first: &Token, rng: &mut R) -> Result<&Token> {
		self.draw_next(&Token::Punctuation('.'), first, rng)
	}

	/// Draws the successor of `(previous, current)` weighted by occurrence.
	///
	/// # Errors
	/// `UnknownTransition` if the pair was never observed.
	pub fn draw_next<R: Rng>(&self, previous: &Token, current: &Token, rng: &mut R) -> Result<&Token> {
		self.successors(previous, current)
			.and_then(|state| state.predict(rng))
			.ok_or_else(|| ModelError::UnknownTransition {
				previous: previous.clone(),
				current: current.clone(),
			})
	}

	/// Merges another model into this one.
	///
	/// Counts of matching pairs are summed and `other`'s starters are
	/// appended after this model's.
	pub fn merge(&mut self, other: &Self) {
		self.starters.extend(other.starters.iter().cloned());

		for (key, state) in &other.transitions {
			if let Some(existing) = self.transitions.get_mut(key) {
				existing.merge(state);
			} else {
				self.transitions.insert(key.clone(), state.clone());
			}
		}
	}

	/// Trains a model from every file below `dir`.
	///
	/// # Behavior
	/// - Lists files recursively and splits them into chunks
	///   (based on CPU cores * factor).
	/// - Spawns threads to build a partial model for each chunk.
	/// - Merges partial models in chunk order, so the result does not depend
	///   on thread scheduling.
	///
	/// # Notes
	/// - A file that cannot be read is logged and skipped.
	///
	/// # Errors
	/// Returns an error if the directory cannot be listed.
	pub fn from_folder<P: AsRef<Path>>(dir: P) -> Result<Self> {
		let folder = normalize_folder(dir);
		if !folder.is_dir() {
			return Err(ModelError::InvalidInput(format!(
				"Expected a directory, got: {}",
				folder.display()
			)));
		}

		let files = list_files_recursive(&folder)?;
		if files.is_empty() {
			warn!("No documents found in {}", folder.display());
			return Ok(CorpusModel::new());
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = files.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		let mut spawned = 0;
		for (index, chunk) in files.chunks(chunk_size).enumerate() {
			spawned += 1;
			let tx = tx.clone();
			let chunk = chunk.to_vec();

			thread::spawn(move || {
				let mut partial_model = CorpusModel::new();
				for path in chunk {
					match read_document(&path) {
						Ok(text) => {
							debug!("Adding {}", path.display());
							partial_model.add_document(&text);
						}
						Err(e) => warn!("Skipping {}: {e}", path.display()),
					}
				}
				// The receiver outlives every sender
				let _ = tx.send((index, partial_model));
			});
		}
		drop(tx);

		// A worker that panicked never sends, so its chunk shows up as missing
		let final_model = Self::merge_partials(spawned, rx.iter().collect())?;

		info!(
			"Trained on {} documents: {} starters, {} pairs, {} observations",
			files.len(),
			final_model.starters.len(),
			final_model.transition_len(),
			final_model.observation_count()
		);
		Ok(final_model)
	}

	/// Merges per-chunk models in chunk order.
	///
	/// # Errors
	/// `IncompleteTraining` if fewer than `expected` chunks came back.
	fn merge_partials(expected: usize, mut partial_models: Vec<(usize, CorpusModel)>) -> Result<Self> {
		if partial_models.len() != expected {
			return Err(ModelError::IncompleteTraining {
				expected,
				received: partial_models.len(),
			});
		}

		partial_models.sort_by_key(|(index, _)| *index);
		let mut final_model = CorpusModel::new();
		for (_, partial_model) in &partial_models {
			final_model.merge(partial_model);
		}
		Ok(final_model)
	}

	/// Serializes the model to `path` with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(&path, bytes)?;
		info!("Saved model to {}", path.as_ref().display());
		Ok(())
	}

	/// Restores a model written by [`CorpusModel::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(&path)?;
		let model = postcard::from_bytes(&bytes)?;
		info!("Loaded model from {}", path.as_ref().display());
		Ok(model)
	}

	/// Loads the cached model if `cache` exists, otherwise trains from
	/// `corpus` and writes the cache for the next run.
	pub fn load_or_train<PC, PM>(corpus: PC, cache: PM) -> Result<Self>
	where
		PC: AsRef<Path>,
		PM: AsRef<Path>,
	{
		if cache.as_ref().exists() {
			return Self::load(cache);
		}
		let model = Self::from_folder(corpus)?;
		model.save(cache)?;
		Ok(model)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn trained(text: &str) -> CorpusModel {
		let mut model = CorpusModel::new();
		model.add_document(text);
		model
	}

	#[test]
	fn test_short_streams_add_nothing() {
		let mut model = CorpusModel::new();
		model.observe(&[]);
		model.observe(&[Token::word("a"), Token::word("b")]);
		assert!(model.is_empty());
	}

	#[test]
	fn test_observation_count_is_windows() {
		let mut model = CorpusModel::new();
		let tokens = normalize("One fish, two fish. Red fish!\nBlue fish.");
		model.observe(&tokens);
		assert_eq!(model.observation_count(), tokens.len() - 2);
	}

	#[test]
	fn test_counts_accumulate_across_documents() {
		let mut model = trained("a b c");
		model.add_document("a b c");
		model.add_document("a b d");
		let state = model.successors(&Token::word("a"), &Token::word("b")).unwrap();
		assert_eq!(state.count(&Token::word("c")), 2);
		assert_eq!(state.count(&Token::word("d")), 1);
	}

	#[test]
	fn test_starters_only_follow_periods() {
		// "here" follows "!", "there" follows "?", "end" follows a paragraph break
		let model = trained("go. now! here? there. \n\nend. again. ok then");
		let starters: Vec<String> = model.starters().iter().map(Token::to_string).collect();
		assert_eq!(starters, ["now", "again", "ok"]);
	}

	#[test]
	fn test_paragraph_break_is_not_a_starter() {
		let model = trained("stop.\nnext one. word here");
		let starters: Vec<String> = model.starters().iter().map(Token::to_string).collect();
		assert_eq!(starters, ["word"]);
	}

	#[test]
	fn test_clear() {
		let mut model = trained("The cat sat. The dog ran.");
		assert!(!model.is_empty());
		model.clear();
		assert!(model.is_empty());
		assert_eq!(model.observation_count(), 0);
	}

	#[test]
	fn test_draws_on_empty_model_fail() {
		let model = CorpusModel::new();
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(model.draw_starter(&mut rng), Err(ModelError::EmptyModel)));
		assert!(matches!(
			model.draw_second(&Token::word("the"), &mut rng),
			Err(ModelError::UnknownTransition { .. })
		));
	}

	#[test]
	fn test_draws() {
		let model = trained("The cat sat. The dog ran.");
		let mut rng = StdRng::seed_from_u64(3);
		let the = Token::word("the");
		assert_eq!(model.draw_starter(&mut rng).unwrap(), &the);
		assert_eq!(model.draw_second(&the, &mut rng).unwrap(), &Token::word("dog"));
		assert_eq!(
			model.draw_next(&Token::word("dog"), &Token::word("ran"), &mut rng).unwrap(),
			&Token::Punctuation('.')
		);

		match model.draw_second(&Token::word("cat"), &mut rng) {
			Err(ModelError::UnknownTransition { previous, current }) => {
				assert_eq!(previous, Token::Punctuation('.'));
				assert_eq!(current, Token::word("cat"));
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn test_merge_matches_sequential_training() {
		let docs = ["The cat sat. The dog ran.", "A dog sat. The cat ran. The end."];
		let mut sequential = CorpusModel::new();
		let mut merged = CorpusModel::new();
		for doc in docs {
			sequential.add_document(doc);
			merged.merge(&trained(doc));
		}
		assert_eq!(sequential, merged);
	}

	#[test]
	fn test_save_and_load() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("model.bin");
		let model = trained("The cat sat. The dog ran. The cat ran.");
		model.save(&path)?;
		let restored = CorpusModel::load(&path)?;
		assert_eq!(restored, model);

		let (cat, sat) = (Token::word("cat"), Token::word("sat"));
		let before: Vec<(&Token, usize)> = model.successors(&Token::word("the"), &cat).unwrap().successors().collect();
		let after: Vec<(&Token, usize)> = restored.successors(&Token::word("the"), &cat).unwrap().successors().collect();
		assert_eq!(before, after);
		assert_eq!(after, vec![(&Token::word("ran"), 1), (&sat, 1)]);
		Ok(())
	}

	#[test]
	fn test_missing_chunk_is_an_error() {
		let partials = vec![(0, trained("The cat sat. The dog ran.")), (2, trained("A b c."))];
		match CorpusModel::merge_partials(3, partials) {
			Err(ModelError::IncompleteTraining { expected, received }) => {
				assert_eq!(expected, 3);
				assert_eq!(received, 2);
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn test_partials_merge_in_chunk_order() -> Result<()> {
		let partials = vec![(1, trained("x. second one here")), (0, trained("y. first one here"))];
		let model = CorpusModel::merge_partials(2, partials)?;
		let starters: Vec<String> = model.starters().iter().map(Token::to_string).collect();
		assert_eq!(starters, ["first", "second"]);
		Ok(())
	}

	#[test]
	fn test_from_folder_is_deterministic() -> Result<()> {
		let dir = tempfile::tempdir()?;
		std::fs::create_dir(dir.path().join("part"))?;
		std::fs::write(dir.path().join("a.txt"), "The cat sat. The dog ran.")?;
		std::fs::write(dir.path().join("part").join("b.txt"), "A bird sang. The bird flew.")?;

		let model = CorpusModel::from_folder(dir.path())?;
		let mut expected = trained("The cat sat. The dog ran.");
		expected.add_document("A bird sang. The bird flew.");
		assert_eq!(model, expected);
		Ok(())
	}

	#[test]
	fn test_from_folder_rejects_files() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("a.txt");
		std::fs::write(&path, "text")?;
		assert!(matches!(CorpusModel::from_folder(&path), Err(ModelError::InvalidInput(_))));
		Ok(())
	}

	#[test]
	fn test_load_or_train_writes_cache() -> Result<()> {
		let corpus = tempfile::tempdir()?;
		std::fs::write(corpus.path().join("a.txt"), "The cat sat. The dog ran.")?;
		let cache_dir = tempfile::tempdir()?;
		let cache = cache_dir.path().join("model.bin");

		let first = CorpusModel::load_or_train(corpus.path(), &cache)?;
		assert!(cache.exists());

		// A second call must come from the cache, not the (now changed) corpus
		std::fs::write(corpus.path().join("b.txt"), "Something else entirely. Yes.")?;
		let second = CorpusModel::load_or_train(corpus.path(), &cache)?;
		assert_eq!(first, second);
		Ok(())
	}
}
