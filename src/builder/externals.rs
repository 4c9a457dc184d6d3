//! Installation of the pinned third-party toolchain ("externals").

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::errors::BuildError;
use crate::platform::PackageManager;
use crate::util::fs::glob_prefixed;

/// Externals packages required to build the plugin, in install order.
pub const EXTERNALS_MANIFEST: [&str; 6] = [
    "irods-externals-boost-libcxx1.81.0-1",
    "irods-externals-clang-runtime13.0.1-0",
    "irods-externals-clang13.0.1-0",
    "irods-externals-cmake3.21.4-0",
    "irods-externals-fmt-libcxx8.1.1-1",
    "irods-externals-json3.10.4-0",
];

/// Where externals packages come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalsSource {
    /// Install by name from the project package repository.
    Repository,
    /// Install from package files under this directory.
    Directory(PathBuf),
}

impl ExternalsSource {
    pub fn from_option(dir: Option<PathBuf>) -> Self {
        dir.map_or(ExternalsSource::Repository, ExternalsSource::Directory)
    }
}

/// The manifest as owned names.
pub fn manifest() -> Vec<String> {
    EXTERNALS_MANIFEST.iter().map(|s| s.to_string()).collect()
}

/// Pick exactly one `<name>*.<suffix>` file in `dir` for every name.
///
/// Nothing is installed by this function; a name with no file, or with
/// several candidate files, fails the whole selection.
pub fn select_package_files(dir: &Path, names: &[String], suffix: &str) -> Result<Vec<PathBuf>> {
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let mut candidates = glob_prefixed(dir, name, suffix)?;
        match candidates.len() {
            0 => {
                return Err(BuildError::MissingDependencyArtifact {
                    name: name.clone(),
                    directory: dir.to_path_buf(),
                }
                .into())
            }
            1 => selected.extend(candidates.pop()),
            _ => {
                return Err(BuildError::AmbiguousDependencyArtifact {
                    name: name.clone(),
                    candidates,
                }
                .into())
            }
        }
    }
    Ok(selected)
}

/// Install `names` from package files under the OS-specific subdirectory of `dir`.
pub fn install_from_directory(pm: &dyn PackageManager, dir: &Path, names: &[String]) -> Result<()> {
    let os_dir = pm.os_specific_subdirectory(dir);
    let files = select_package_files(&os_dir, names, pm.package_suffix())?;
    for file in &files {
        tracing::debug!("selected {}", file.display());
    }
    pm.install_packages_from_files(&files)
}

/// Install the externals manifest from `source`.
pub fn install_externals(pm: &dyn PackageManager, source: &ExternalsSource) -> Result<()> {
    let names = manifest();
    match source {
        ExternalsSource::Repository => {
            tracing::info!("Installing externals from the package repository");
            pm.install_project_repository()?;
            pm.install_packages_by_name(&names)
        }
        ExternalsSource::Directory(dir) => {
            tracing::info!("Installing externals from {}", dir.display());
            install_from_directory(pm, dir, &names)
        }
    }
}

/// Install the plugin host's own runtime and development packages from `dir`.
pub fn install_host_packages(pm: &dyn PackageManager, dir: &Path, names: &[String]) -> Result<()> {
    tracing::info!("Installing host packages from {}", dir.display());
    install_from_directory(pm, dir, names)
}
