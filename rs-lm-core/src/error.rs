use thiserror::Error;

/// Errors raised by model construction, fitting, queries and persistence.
///
/// Every variant is a usage or environment error surfaced at the call that
/// violated the precondition. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum LmError {
	/// The model order `n` must be at least 1.
	#[error("invalid order: n must be >= 1, got {0}")]
	InvalidOrder(usize),

	/// The smoothing strength must be finite and at least `MIN_ALPHA`.
	#[error("invalid smoothing: alpha must be finite and >= 1e-100, got {0}")]
	InvalidSmoothing(f64),

	/// A probability or perplexity was requested before a successful fit,
	/// or the model has an empty vocabulary.
	#[error("model is not fitted")]
	UnfittedModel,

	/// The evaluated sequence is too short to contain a single window.
	#[error("cannot evaluate {len} token(s) with a {order}-gram model")]
	EmptyEvaluation { order: usize, len: usize },

	/// `fit` was called on a model that has already been fitted.
	#[error("model is already fitted")]
	AlreadyFitted,

	/// Two models with different order or smoothing were merged.
	#[error("configuration mismatch: {0}")]
	ConfigMismatch(String),

	/// A registry already holds a model with this name.
	#[error("model {0} already loaded")]
	DuplicateModel(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error("serialization failed: {0}")]
	Serialization(#[from] postcard::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LmError>;
