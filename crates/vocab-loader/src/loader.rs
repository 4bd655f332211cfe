//! Source directory discovery.
//!
//! A source root holds one subdirectory per vocabulary or value-set source.
//! The subdirectory name selects the loader; the files directly inside it
//! are handed to that loader as one batch.

use std::fs;
use std::path::Path;

use crate::types::{LoadError, LoadResult, SourceDirectory};

/// Checks that `path` can serve as a source root.
///
/// A path that does not exist is reported as `DirectoryNotFound`; a path
/// that names a file is reported as `NotADirectory`.
pub fn check_source_root<P: AsRef<Path>>(path: P) -> LoadResult<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(LoadError::DirectoryNotFound {
            path: path.display().to_string(),
        });
    }
    if !path.is_dir() {
        return Err(LoadError::NotADirectory {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Lists the source subdirectories of a root, sorted by name.
///
/// Hidden directories (names starting with `.`) and plain files at the root
/// level are skipped.
pub fn discover_sources<P: AsRef<Path>>(root: P) -> LoadResult<Vec<SourceDirectory>> {
    let root = root.as_ref();
    check_source_root(root)?;

    let mut sources = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if is_hidden(&name) || !entry.file_type()?.is_dir() {
            continue;
        }

        let path = entry.path();
        let files = list_files(&path)?;
        sources.push(SourceDirectory { name, path, files });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}

fn list_files(dir: &Path) -> LoadResult<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Returns the file name of `path` as text, or an empty string.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Formats a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
