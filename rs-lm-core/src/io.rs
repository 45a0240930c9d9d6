use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a text file and splits it into whitespace-separated tokens.
///
/// - Reads the entire file into memory
/// - Line breaks are ordinary whitespace: the file is one token stream
/// - No other normalization is applied
pub fn read_tokens<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.split_whitespace().map(str::to_owned).collect())
}

/// Path of the binary cache kept beside a corpus file.
///
/// `data/english.dat` → `data/english.bin`
pub fn cache_path<P: AsRef<Path>>(corpus_path: P) -> PathBuf {
	corpus_path.as_ref().with_extension("bin")
}

/// Model name of a corpus file: its file stem.
///
/// Fails for paths without a file name, such as `..` or `/`.
pub fn model_name<P: AsRef<Path>>(corpus_path: P) -> io::Result<String> {
	match corpus_path.as_ref().file_stem() {
		Some(stem) => Ok(stem.to_string_lossy().into_owned()),
		None => Err(io::Error::new(
			io::ErrorKind::InvalidInput,
			format!("{} has no file name", corpus_path.as_ref().display()),
		)),
	}
}

/// Directory to scan for corpora; `.` is resolved to the working directory.
pub fn resolve_dir<P: AsRef<Path>>(dir: P) -> io::Result<PathBuf> {
	let dir = dir.as_ref();
	if dir == Path::new(".") {
		return env::current_dir();
	}
	Ok(dir.to_path_buf())
}

/// Lists all files with a given extension in a directory, sorted by name.
///
/// Returns file names only (no paths).
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}
