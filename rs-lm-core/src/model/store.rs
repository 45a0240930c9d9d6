use std::path::Path;

use log::{info, warn};

use super::config::ModelConfig;
use super::ngram_model::NGramModel;
use crate::error::Result;
use crate::io::{cache_path, read_tokens};

impl NGramModel {
	/// Writes the model (config, vocabulary, count tables) to `path` with `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(&path, bytes)?;
		info!("Saved {}-gram model to {}", self.order(), path.as_ref().display());
		Ok(())
	}

	/// Reads a model written by `save`.
	///
	/// # Errors
	/// - `Io` / `Serialization` if the file cannot be read or decoded
	/// - `InvalidOrder` / `InvalidSmoothing` if the stored config is invalid
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(&path)?;
		let model: NGramModel = postcard::from_bytes(&bytes)?;
		model.config().validate()?;
		info!(
			"Loaded {}-gram model from {} ({} contexts)",
			model.order(),
			path.as_ref().display(),
			model.context_count()
		);
		Ok(model)
	}

	/// Loads the binary cache of a corpus file, or fits and caches it.
	///
	/// - `corpus_path` is a whitespace-tokenized text file.
	/// - The cache lives beside it with a `.bin` extension.
	/// - A cache built with a different config, or one that cannot be
	///   decoded, is ignored and rewritten.
	pub fn load_or_fit<P: AsRef<Path>>(corpus_path: P, config: ModelConfig) -> Result<Self> {
		let binary_data_path = cache_path(&corpus_path);
		if binary_data_path.exists() {
			match Self::load(&binary_data_path) {
				Ok(model) if *model.config() == config => return Ok(model),
				Ok(model) => warn!(
					"Cache {} was built with n={}, alpha={}; refitting",
					binary_data_path.display(),
					model.order(),
					model.alpha()
				),
				Err(e) => warn!("Cache {} is unreadable ({}); refitting", binary_data_path.display(), e),
			}
		}

		let tokens = read_tokens(&corpus_path)?;
		let mut model = Self::new(config);
		model.fit_parallel(&tokens)?;
		model.save(&binary_data_path)?;
		Ok(model)
	}
}
