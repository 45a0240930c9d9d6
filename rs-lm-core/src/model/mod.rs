//! Top-level module for the n-gram language model.
//!
//! It contains:
//! - Validated model parameters (`ModelConfig`)
//! - Hashable token contexts (`Context`)
//! - The fixed-order counter, estimator and evaluator (`NGramModel`)
//! - Per-context count rows (`State`)
//! - Evaluation reports (`Evaluation`)
//! - Multithreaded fitting and binary persistence
//! - A set of named models (`ModelRegistry`)

/// Order and smoothing parameters, validated at construction.
pub mod config;

/// Ordered token tuple used as a count table key.
pub mod context;

/// Result of scoring a token sequence (log-likelihood, cross-entropy, perplexity).
pub mod evaluation;

/// Fixed-order n-gram model (`n >= 1`).
///
/// Handles fitting, count merging, smoothed log-probabilities and perplexity.
pub mod ngram_model;

/// Chunked multithreaded fitting.
pub mod parallel;

/// Named models loaded from a directory and ranked by perplexity.
pub mod registry;

/// Internal count row for a single context.
///
/// Tracks target counts and their cached total.
/// This module is not exposed publicly.
mod state;

/// Binary persistence of fitted models.
pub mod store;
