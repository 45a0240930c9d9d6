use std::collections::HashMap;
use std::path::Path;

use log::info;

use super::config::ModelConfig;
use super::ngram_model::NGramModel;
use crate::error::{LmError, Result};
use crate::io;

/// A set of named, fitted n-gram models.
///
/// # Responsibilities
/// - Load every corpus of a directory as its own model
/// - Look models up by name
/// - Rank models by how well they predict a token sequence
///
/// Models are never mutated once registered, so a registry can be shared
/// between threads without locking.
#[derive(Debug, Default)]
pub struct ModelRegistry {
	models: HashMap<String, NGramModel>,
}

impl ModelRegistry {
	/// Creates an empty registry.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Creates a registry by loading all `.dat` corpora from a directory.
	///
	/// # Parameters
	/// - `dir`: Path to a directory containing corpus files.
	///   Both `"folder"` and `"folder/"` are accepted, `"."` is the working directory.
	/// - `config`: Parameters used for every model.
	///
	/// # Behavior
	/// - Each corpus is loaded through `NGramModel::load_or_fit`, reusing its `.bin` cache.
	/// - The model name is the file name without extension.
	/// - Only files directly contained in the directory are loaded.
	///
	/// # Errors
	/// - `Io` if the path is not a directory or a corpus cannot be read
	/// - Any error raised while fitting or loading a model
	pub fn new<P: AsRef<Path>>(dir: P, config: ModelConfig) -> Result<Self> {
		let mut registry = Self::empty();

		let folder = io::resolve_dir(&dir)?;
		if !folder.is_dir() {
			return Err(LmError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Expected a directory, got: {}", folder.display()),
			)));
		}

		for file in io::list_files(&folder, "dat")? {
			let full_path = folder.join(&file);
			let name = io::model_name(&full_path)?;
			let model = NGramModel::load_or_fit(&full_path, config)?;
			registry.insert(name, model)?;
		}

		info!("Registry loaded {} model(s) from {}", registry.len(), folder.display());
		Ok(registry)
	}

	/// Registers a model under `name`.
	///
	/// # Errors
	/// `DuplicateModel` if the name is taken.
	pub fn insert(&mut self, name: impl Into<String>, model: NGramModel) -> Result<()> {
		let name = name.into();
		if self.models.contains_key(&name) {
			return Err(LmError::DuplicateModel(name));
		}
		self.models.insert(name, model);
		Ok(())
	}

	/// Names of the registered models, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.models.keys().cloned().collect();
		names.sort();
		names
	}

	pub fn get(&self, name: &str) -> Option<&NGramModel> {
		self.models.get(name)
	}

	pub fn len(&self) -> usize {
		self.models.len()
	}

	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}

	/// Scores `tokens` with every model, lowest perplexity first.
	///
	/// Ties keep name order.
	///
	/// # Errors
	/// The first evaluation error encountered (e.g. `EmptyEvaluation`).
	pub fn rank<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<(String, f64)>> {
		let mut scored = Vec::with_capacity(self.models.len());
		for name in self.names() {
			let perplexity = self.models[&name].perplexity(tokens)?;
			scored.push((name, perplexity));
		}

		scored.sort_by(|a, b| a.1.total_cmp(&b.1));
		Ok(scored)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn fitted(tokens: &[&str]) -> NGramModel {
		let mut model = NGramModel::with_order(2, 1.0).unwrap();
		model.fit(tokens).unwrap();
		model
	}

	#[test]
	fn duplicate_names_are_rejected() {
		let mut registry = ModelRegistry::empty();
		registry.insert("en", fitted(&["a", "b"])).unwrap();
		assert!(matches!(
			registry.insert("en", fitted(&["c", "d"])),
			Err(LmError::DuplicateModel(name)) if name == "en"
		));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn rank_puts_matching_model_first() {
		let mut registry = ModelRegistry::empty();
		registry.insert("abc", fitted(&["a", "b", "c", "a", "b", "c", "a", "b", "c"])).unwrap();
		registry.insert("xyz", fitted(&["x", "y", "z", "x", "y", "z"])).unwrap();

		let ranking = registry.rank(&["a", "b", "c", "a"]).unwrap();
		assert_eq!(ranking.len(), 2);
		assert_eq!(ranking[0].0, "abc");
		assert!(ranking[0].1 < ranking[1].1);
	}

	#[test]
	fn rank_propagates_empty_evaluation() {
		let mut registry = ModelRegistry::empty();
		registry.insert("abc", fitted(&["a", "b", "c"])).unwrap();
		assert!(matches!(registry.rank(&["a"]), Err(LmError::EmptyEvaluation { .. })));
	}

	#[test]
	fn loads_every_corpus_of_a_directory() {
		let dir = tempdir().unwrap();
		std::fs::write(dir.path().join("english.dat"), "the cat sat on the mat").unwrap();
		std::fs::write(dir.path().join("numbers.dat"), "one two three one two three").unwrap();
		std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

		let config = ModelConfig::new(2, 1.0).unwrap();
		let registry = ModelRegistry::new(dir.path(), config).unwrap();
		assert_eq!(registry.names(), ["english", "numbers"]);
		assert_eq!(registry.get("english").unwrap().count(&["the"], "cat"), 1);
		assert!(registry.get("notes").is_none());
	}

	#[test]
	fn missing_directory_is_an_error() {
		let dir = tempdir().unwrap();
		let config = ModelConfig::default();
		assert!(matches!(ModelRegistry::new(dir.path().join("absent"), config), Err(LmError::Io(_))));
	}
}
