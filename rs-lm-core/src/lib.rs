//! Statistical n-gram language models over tokenized text.
//!
//! This crate provides:
//! - Context-conditioned n-gram counting over a token stream
//! - Additive (Laplace) smoothed conditional log-probabilities
//! - Perplexity evaluation over held-out token sequences
//! - Multithreaded fitting, binary persistence and a registry of named models
//!
//! Tokens are expected to be already normalized by the caller: the crate
//! never lower-cases, strips or maps unknown words itself.

/// N-gram models, their configuration and evaluation.
pub mod model;

/// Error type shared by the whole crate.
pub mod error;

/// I/O utilities (token files, path helpers).
pub mod io;

pub use error::{LmError, Result};
pub use model::config::{MIN_ALPHA, ModelConfig};
pub use model::context::Context;
pub use model::evaluation::Evaluation;
pub use model::ngram_model::NGramModel;
pub use model::registry::ModelRegistry;
