//! Pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::util::process::display_exit_code;

/// A fatal pipeline failure.
///
/// Operations return `anyhow::Result`; these are the typed causes callers can
/// recover with `downcast_ref::<BuildError>()`.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unsupported platform: `{distribution}`")]
    UnsupportedPlatform { distribution: String },

    #[error("no package file found for `{name}` in {}", directory.display())]
    MissingDependencyArtifact { name: String, directory: PathBuf },

    #[error("more than one package file matches `{name}`: {}", display_paths(candidates))]
    AmbiguousDependencyArtifact {
        name: String,
        candidates: Vec<PathBuf>,
    },

    #[error("{step} step failed with exit code {}: `{command}`\n{stderr}", display_exit_code(*code))]
    SubprocessFailure {
        step: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("filesystem error at {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
