//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::{glob, Pattern};
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Whether `a` and `b` resolve to the same existing file.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Find files in `dir` whose names start with `prefix` and end with `.<extension>`.
///
/// Both `dir` and `prefix` are escaped, so glob metacharacters in package
/// names are matched literally.
pub fn glob_prefixed(dir: &Path, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/{}*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(prefix),
        Pattern::escape(extension)
    );

    let mut results = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    results.push(path);
                }
            }
            Err(e) => {
                tracing::warn!("glob error: {}", e);
            }
        }
    }

    results.sort();
    Ok(results)
}

/// Recursively list regular files under `root` whose file name satisfies `predicate`.
pub fn find_files<F>(root: &Path, predicate: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut results = Vec::new();
    for entry in WalkDir::new(root) {
        let entry =
            entry.with_context(|| format!("failed to walk directory: {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(&predicate) {
            results.push(entry.into_path());
        }
    }
    results.sort();
    Ok(results)
}

/// Make `path` absolute against the current directory without touching the filesystem.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("failed to resolve path: {}", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}
