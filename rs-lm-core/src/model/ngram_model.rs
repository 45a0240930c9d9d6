use std::collections::{HashMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::config::ModelConfig;
use super::context::Context;
use super::evaluation::Evaluation;
use super::state::State;
use crate::error::{LmError, Result};

/// Additive-smoothed n-gram language model over string tokens.
///
/// The `NGramModel` stores, for each context of `n-1` tokens, the counts of
/// every target token observed right after it. Those counts are turned into
/// Laplace-smoothed conditional probabilities on demand.
///
/// # Lifecycle
/// A model starts **unfitted**. One successful call to `fit`,
/// `fit_segments` or `fit_parallel` makes it **fitted**; a second call is
/// rejected with `AlreadyFitted`. Queries on an unfitted model fail with
/// `UnfittedModel`.
///
/// # Vocabulary
/// By default the vocabulary is the set of distinct tokens of the fitting
/// corpus. A model built with `with_vocabulary` keeps the supplied
/// vocabulary and extends it with every token seen while fitting.
///
/// # Invariants
/// - Every stored count is `>= 1`
/// - Each context row total equals the sum of its counts
/// - Every counted target belongs to the vocabulary
/// - Tables only grow through fitting or `merge`
///
/// A fitted model is plain owned data and can be shared between threads
/// for read-only queries.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// Order and smoothing strength
	config: ModelConfig,

	/// Tokens the model assigns probability mass to
	vocabulary: HashSet<String>,

	/// Whether `vocabulary` was supplied by the caller
	external_vocabulary: bool,

	/// Mapping from a context (length n-1) to its count row
	states: HashMap<Context, State>,

	fitted: bool,
}

impl NGramModel {
	/// Creates an unfitted model whose vocabulary will come from the fitting corpus.
	pub fn new(config: ModelConfig) -> Self {
		Self {
			config,
			vocabulary: HashSet::new(),
			external_vocabulary: false,
			states: HashMap::new(),
			fitted: false,
		}
	}

	/// Creates an unfitted model of order `n` with smoothing `alpha`.
	///
	/// # Errors
	/// `InvalidOrder` or `InvalidSmoothing` for invalid parameters.
	pub fn with_order(n: usize, alpha: f64) -> Result<Self> {
		Ok(Self::new(ModelConfig::new(n, alpha)?))
	}

	/// Creates an unfitted model over a caller-supplied vocabulary.
	///
	/// Fitting keeps this vocabulary and adds any new token it encounters.
	pub fn with_vocabulary<I, S>(config: ModelConfig, vocabulary: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			vocabulary: vocabulary.into_iter().map(Into::into).collect(),
			external_vocabulary: true,
			..Self::new(config)
		}
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// The model order `n`.
	pub fn order(&self) -> usize {
		self.config.order()
	}

	pub fn alpha(&self) -> f64 {
		self.config.alpha()
	}

	pub fn is_fitted(&self) -> bool {
		self.fitted
	}

	pub fn vocabulary(&self) -> &HashSet<String> {
		&self.vocabulary
	}

	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary.len()
	}

	/// Number of distinct contexts observed.
	pub fn context_count(&self) -> usize {
		self.states.len()
	}

	/// Number of distinct (context, target) cells.
	pub fn ngram_count(&self) -> usize {
		self.states.values().map(State::len).sum()
	}

	/// Iterates over every (context, target, count) cell, in no particular order.
	pub fn ngrams(&self) -> impl Iterator<Item = (&Context, &str, u64)> {
		self.states
			.iter()
			.flat_map(|(context, state)| state.targets().map(move |(target, count)| (context, target, count)))
	}

	/// Raw count of `target` after `context`, with the query truncation rule applied.
	pub fn count<S: AsRef<str>>(&self, context: &[S], target: &str) -> u64 {
		self.state(context).map_or(0, |state| state.count(target))
	}

	/// Raw number of windows starting with `context`, with the query truncation rule applied.
	pub fn context_total<S: AsRef<str>>(&self, context: &[S]) -> u64 {
		self.state(context).map_or(0, State::total)
	}

	/// Counts every n-gram window of `tokens`.
	///
	/// Each window of `n` consecutive tokens is split into a context (first
	/// `n-1` tokens) and a target (last token). Sequences shorter than `n`
	/// produce no windows but still fit the model.
	///
	/// # Errors
	/// `AlreadyFitted` if the model was fitted before.
	pub fn fit<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<()> {
		self.fit_segments(&[tokens])
	}

	/// Counts the windows of several independent token streams.
	///
	/// Windows never cross from one segment into the next. The resulting
	/// tables are the cell-by-cell sum of fitting each segment on its own.
	///
	/// # Errors
	/// `AlreadyFitted` if the model was fitted before.
	pub fn fit_segments<S: AsRef<str>>(&mut self, segments: &[&[S]]) -> Result<()> {
		self.ensure_unfitted()?;

		let mut vocabulary = HashSet::new();
		let mut windows = 0;
		for &tokens in segments {
			vocabulary.extend(tokens.iter().map(|t| t.as_ref().to_owned()));
			windows += count_windows(&mut self.states, tokens, self.config.order());
		}
		self.absorb_vocabulary(vocabulary);
		self.fitted = true;

		info!(
			"Fitted {}-gram model: {} windows, {} contexts, vocabulary of {}",
			self.order(),
			windows,
			self.states.len(),
			self.vocabulary.len()
		);
		Ok(())
	}

	/// Adds another model's counts into this one, cell by cell.
	///
	/// Vocabularies are united. The result is fitted if either side was.
	///
	/// # Errors
	/// `ConfigMismatch` if order or smoothing differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.config != other.config {
			return Err(LmError::ConfigMismatch(format!(
				"self=(n={}, alpha={}), other=(n={}, alpha={})",
				self.order(),
				self.alpha(),
				other.order(),
				other.alpha()
			)));
		}

		merge_states(&mut self.states, &other.states);
		self.vocabulary.extend(other.vocabulary.iter().cloned());
		self.external_vocabulary |= other.external_vocabulary;
		self.fitted |= other.fitted;
		Ok(())
	}

	/// Natural log of the smoothed probability of `target` after `context`.
	///
	/// Only the trailing `n-1` tokens of `context` are used; a shorter
	/// context is looked up as-is. Computes
	/// `(count(context, target) + alpha) / (count(context) + alpha * |V|)`,
	/// which is strictly positive for any context and target.
	///
	/// # Errors
	/// `UnfittedModel` if the model is unfitted or its vocabulary is empty.
	pub fn log_probability<S: AsRef<str>>(&self, context: &[S], target: &str) -> Result<f64> {
		self.ensure_fitted()?;
		Ok(self.smoothed_log_prob(self.state(context), target))
	}

	/// `exp(log_probability)`, always within `(0, 1]`.
	pub fn probability<S: AsRef<str>>(&self, context: &[S], target: &str) -> Result<f64> {
		Ok(self.log_probability(context, target)?.exp())
	}

	/// Scores every window of `tokens` from position `n-1` onward.
	///
	/// # Errors
	/// - `UnfittedModel` if the model is unfitted
	/// - `EmptyEvaluation` if `tokens` is shorter than `n`
	pub fn evaluate<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Evaluation> {
		self.ensure_fitted()?;

		let n = self.config.order();
		if tokens.len() < n {
			return Err(LmError::EmptyEvaluation { order: n, len: tokens.len() });
		}

		let context_len = self.config.context_len();
		let mut log_prob_sum = 0.0;
		for window in tokens.windows(n) {
			let (context, target) = window.split_at(context_len);
			let state = self.states.get(&Context::new(context));
			log_prob_sum += self.smoothed_log_prob(state, target[0].as_ref());
		}

		let evaluation = Evaluation::new(log_prob_sum, tokens.len() - context_len);
		debug!(
			"Evaluated {} tokens: cross-entropy {:.4} nats, perplexity {:.4}",
			evaluation.tokens_scored(),
			evaluation.cross_entropy(),
			evaluation.perplexity()
		);
		Ok(evaluation)
	}

	/// Perplexity of the model over `tokens`: `exp(-sum(log P) / N)`.
	///
	/// # Errors
	/// Same as `evaluate`.
	pub fn perplexity<S: AsRef<str>>(&self, tokens: &[S]) -> Result<f64> {
		Ok(self.evaluate(tokens)?.perplexity())
	}

	/// Looks up the row for a query context, keeping its trailing `n-1` tokens.
	fn state<S: AsRef<str>>(&self, context: &[S]) -> Option<&State> {
		self.states.get(&Context::trailing(context, self.config.context_len()))
	}

	/// `ln((c + alpha) / (t + alpha * |V|))`, with both sides divided by `alpha`.
	///
	/// `ln(alpha)` cancels out, so neither side overflows for a huge `alpha`,
	/// and `c / alpha` stays finite for any `alpha >= MIN_ALPHA`.
	fn smoothed_log_prob(&self, state: Option<&State>, target: &str) -> f64 {
		let alpha = self.config.alpha();
		let (count, total) = state.map_or((0, 0), |s| (s.count(target), s.total()));
		let numerator = (count as f64 / alpha).ln_1p();
		let denominator = (total as f64 / alpha + self.vocabulary.len() as f64).ln();
		numerator - denominator
	}

	pub(crate) fn ensure_unfitted(&self) -> Result<()> {
		if self.fitted {
			return Err(LmError::AlreadyFitted);
		}
		Ok(())
	}

	fn ensure_fitted(&self) -> Result<()> {
		if !self.fitted || self.vocabulary.is_empty() {
			return Err(LmError::UnfittedModel);
		}
		Ok(())
	}

	/// Installs the fitting corpus vocabulary, or extends a supplied one.
	pub(crate) fn absorb_vocabulary(&mut self, vocabulary: HashSet<String>) {
		if self.external_vocabulary {
			self.vocabulary.extend(vocabulary);
		} else {
			self.vocabulary = vocabulary;
		}
	}

	/// Installs tables counted elsewhere and marks the model fitted.
	pub(crate) fn install(&mut self, states: HashMap<Context, State>, vocabulary: HashSet<String>) {
		self.states = states;
		self.absorb_vocabulary(vocabulary);
		self.fitted = true;
	}

	#[cfg(test)]
	pub(crate) fn states(&self) -> &HashMap<Context, State> {
		&self.states
	}
}

/// Counts all n-gram windows of `tokens` into `states`, in stream order.
///
/// Returns the number of windows counted.
pub(crate) fn count_windows<S: AsRef<str>>(states: &mut HashMap<Context, State>, tokens: &[S], n: usize) -> usize {
	if tokens.len() < n {
		// Sequence too short, no windows to count
		return 0;
	}

	for window in tokens.windows(n) {
		let (context, target) = window.split_at(n - 1);
		states
			.entry(Context::new(context))
			.or_insert_with(State::new)
			.add_transition(target[0].as_ref());
	}
	tokens.len() - n + 1
}

/// Adds every row of `other` into `states`.
pub(crate) fn merge_states(states: &mut HashMap<Context, State>, other: &HashMap<Context, State>) {
	for (context, state) in other {
		if let Some(existing) = states.get_mut(context) {
			existing.merge(state);
		} else {
			states.insert(context.clone(), state.clone());
		}
	}
}
