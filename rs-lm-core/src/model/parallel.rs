use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::thread;

use log::debug;

use super::context::Context;
use super::ngram_model::{NGramModel, count_windows, merge_states};
use super::state::State;
use crate::error::Result;

/// Number of chunks handed out per CPU core.
const CHUNKS_PER_CPU: usize = 8;

impl NGramModel {
	/// Fits the model like `fit`, counting chunks of the stream on worker threads.
	///
	/// # Behavior
	/// - Splits the window start positions into `cpus * 8` ranges (at most one per window).
	/// - Each worker receives its range of tokens plus the `n-1` tokens that
	///   follow, so every window is counted by exactly one worker.
	/// - Partial tables are collected through a channel and merged.
	///
	/// The resulting tables are identical to those of `fit`.
	///
	/// # Errors
	/// `AlreadyFitted` if the model was fitted before.
	pub fn fit_parallel<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
		self.ensure_unfitted()?;

		let n = self.order();
		let windows = (tokens.len() + 1).saturating_sub(n);
		if windows == 0 {
			return self.fit(tokens);
		}

		let chunks = (num_cpus::get() * CHUNKS_PER_CPU).min(windows);
		let chunk_size = windows.div_ceil(chunks);
		debug!("Counting {} windows in chunks of {}", windows, chunk_size);

		let (tx, rx) = mpsc::channel();
		for start in (0..windows).step_by(chunk_size) {
			let end = (start + chunk_size).min(windows);
			let tx = tx.clone();
			// Windows starting in [start, end) need tokens up to end + n - 1
			let chunk: Vec<String> = tokens[start..end + n - 1]
				.iter()
				.map(|t| t.as_ref().to_owned())
				.collect();

			thread::spawn(move || {
				let mut partial: HashMap<Context, State> = HashMap::new();
				count_windows(&mut partial, &chunk, n);
				// The receiver outlives every sender
				let _ = tx.send(partial);
			});
		}
		drop(tx);

		let mut states = HashMap::new();
		for partial in rx.iter() {
			merge_states(&mut states, &partial);
		}

		let vocabulary: HashSet<String> = tokens.iter().map(|t| t.as_ref().to_owned()).collect();
		self.install(states, vocabulary);
		debug!(
			"Merged {} contexts from parallel chunks, vocabulary of {}",
			self.context_count(),
			self.vocabulary_size()
		);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::error::LmError;
	use crate::model::config::ModelConfig;
	use crate::model::ngram_model::NGramModel;

	fn corpus() -> Vec<String> {
		"the cat sat on the mat and the dog sat on the log while the cat ran"
			.split_whitespace()
			.cycle()
			.take(997)
			.map(str::to_owned)
			.collect()
	}

	#[test]
	fn parallel_tables_equal_sequential() {
		let tokens = corpus();
		for n in 1..=4 {
			let mut sequential = NGramModel::with_order(n, 1.0).unwrap();
			sequential.fit(&tokens).unwrap();
			let mut parallel = NGramModel::with_order(n, 1.0).unwrap();
			parallel.fit_parallel(&tokens).unwrap();

			assert_eq!(sequential.states(), parallel.states());
			assert_eq!(sequential.vocabulary(), parallel.vocabulary());
			assert!(parallel.is_fitted());
		}
	}

	#[test]
	fn parallel_keeps_external_vocabulary() {
		let config = ModelConfig::new(2, 0.5).unwrap();
		let mut model = NGramModel::with_vocabulary(config, ["zebra", "<PAD>", "cat"]);
		model.fit_parallel(&corpus()).unwrap();

		assert!(model.vocabulary().contains("zebra"));
		assert!(model.vocabulary().contains("<PAD>"));
		assert!(model.vocabulary().contains("log"));
		let total: f64 = model
			.vocabulary()
			.iter()
			.map(|target| model.probability(&["the"], target).unwrap())
			.sum();
		assert!((total - 1.0).abs() < 1e-9);
		assert!(model.probability(&["the"], "zebra").unwrap() > 0.0);
	}

	#[test]
	fn parallel_on_short_sequence() {
		let mut model = NGramModel::with_order(3, 1.0).unwrap();
		model.fit_parallel(&["a", "b"]).unwrap();
		assert!(model.is_fitted());
		assert_eq!(model.context_count(), 0);
		assert_eq!(model.vocabulary_size(), 2);
	}

	#[test]
	fn parallel_refit_is_rejected() {
		let mut model = NGramModel::with_order(2, 1.0).unwrap();
		model.fit_parallel(&corpus()).unwrap();
		assert!(matches!(model.fit_parallel(&corpus()), Err(LmError::AlreadyFitted)));
	}
}
