use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a whole document into memory.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, so a garbled
/// document degrades into fewer tokens instead of an error.
pub(crate) fn read_document<P: AsRef<Path>>(filename: P) -> io::Result<String> {
	let bytes = fs::read(filename)?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder<P: AsRef<Path>>(input: P) -> PathBuf {
	let input = input.as_ref();
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists every regular file below `dir`, walking subdirectories.
///
/// Returns full paths, sorted so that corpus order is stable across runs.
pub(crate) fn list_files_recursive<P: AsRef<Path>>(dir: P) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut pending = vec![dir.as_ref().to_path_buf()];

	while let Some(current) = pending.pop() {
		for entry in fs::read_dir(&current)? {
			let path = entry?.path();
			if path.is_dir() {
				pending.push(path);
			} else if path.is_file() {
				files.push(path);
			}
		}
	}

	files.sort();
	Ok(files)
}
