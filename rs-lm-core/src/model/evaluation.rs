use serde::{Deserialize, Serialize};

/// Summary of a model scored over a token sequence.
///
/// Only produced for sequences with at least one scored window, so
/// `tokens_scored` is never zero.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
	log_prob_sum: f64,
	tokens_scored: usize,
}

impl Evaluation {
	pub(crate) fn new(log_prob_sum: f64, tokens_scored: usize) -> Self {
		debug_assert!(tokens_scored > 0);
		Self { log_prob_sum, tokens_scored }
	}

	/// Sum of natural log-probabilities over all scored windows.
	pub fn log_prob_sum(&self) -> f64 {
		self.log_prob_sum
	}

	/// Number of scored windows `N`.
	pub fn tokens_scored(&self) -> usize {
		self.tokens_scored
	}

	/// Average negative log-probability per token, in nats.
	pub fn cross_entropy(&self) -> f64 {
		-self.log_prob_sum / self.tokens_scored as f64
	}

	/// `exp(cross_entropy)`. Lower is better; 1 is a perfect predictor.
	pub fn perplexity(&self) -> f64 {
		self.cross_entropy().exp()
	}
}
