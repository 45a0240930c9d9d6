use serde::{Deserialize, Serialize};

use crate::error::{LmError, Result};

/// Smallest accepted smoothing strength.
///
/// Below it, the probability of an unseen target after a frequent context
/// gets so close to 0 that perplexity no longer fits in an `f64`.
pub const MIN_ALPHA: f64 = 1e-100;

/// Parameters of an n-gram model.
///
/// `ModelConfig` is an explicit, caller-owned value: there is no process-wide
/// default model. Both fields are fixed once the config exists.
///
/// # Invariants
/// - `order >= 1`
/// - `alpha` is finite and `>= MIN_ALPHA`, so every smoothed probability is
///   strictly positive and every perplexity is finite
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ModelConfig {
	/// Number of tokens in an n-gram (context is `order - 1` tokens).
	order: usize,

	/// Additive smoothing strength added to every count.
	alpha: f64,
}

impl ModelConfig {
	/// Creates a validated configuration.
	///
	/// # Errors
	/// - `InvalidOrder` if `order < 1`
	/// - `InvalidSmoothing` if `alpha` is not finite or below `MIN_ALPHA`
	pub fn new(order: usize, alpha: f64) -> Result<Self> {
		if order < 1 {
			return Err(LmError::InvalidOrder(order));
		}
		if !alpha.is_finite() || alpha < MIN_ALPHA {
			return Err(LmError::InvalidSmoothing(alpha));
		}
		Ok(Self { order, alpha })
	}

	/// Re-checks the invariants.
	///
	/// Deserialization does not go through `new`, so configs read from disk
	/// must be validated before use.
	pub(crate) fn validate(self) -> Result<Self> {
		Self::new(self.order, self.alpha)
	}

	/// The model order `n`.
	pub fn order(&self) -> usize {
		self.order
	}

	/// The smoothing strength.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Number of tokens in a full context (`n - 1`).
	pub fn context_len(&self) -> usize {
		self.order - 1
	}
}

impl Default for ModelConfig {
	/// Trigram model with Laplace smoothing.
	fn default() -> Self {
		Self { order: 3, alpha: 1.0 }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_zero_order() {
		assert!(matches!(ModelConfig::new(0, 1.0), Err(LmError::InvalidOrder(0))));
	}

	#[test]
	fn rejects_non_positive_alpha() {
		for alpha in [0.0, -1.0, f64::NAN, f64::INFINITY, 5e-324, f64::MIN_POSITIVE, MIN_ALPHA / 2.0] {
			assert!(matches!(ModelConfig::new(2, alpha), Err(LmError::InvalidSmoothing(_))));
		}
	}

	#[test]
	fn accepts_extreme_but_representable_alpha() {
		assert!(ModelConfig::new(2, MIN_ALPHA).is_ok());
		assert!(ModelConfig::new(2, f64::MAX).is_ok());
	}

	#[test]
	fn unigram_has_empty_context() {
		let config = ModelConfig::new(1, 0.5).unwrap();
		assert_eq!(config.context_len(), 0);
		assert_eq!(config.alpha(), 0.5);
	}

	#[test]
	fn default_is_laplace_trigram() {
		let config = ModelConfig::default();
		assert_eq!(config.order(), 3);
		assert_eq!(config.alpha(), 1.0);
		assert!(config.validate().is_ok());
	}
}
