//! Discovery and collection of built package files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::errors::BuildError;
use crate::platform::matches_suffix;
use crate::util::fs::{find_files, relative_path, same_file};

/// Every regular file under `build_dir` named `*.<suffix>`.
pub fn find_artifacts(build_dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    find_files(build_dir, |name| matches_suffix(name, suffix))
}

/// Copy every package file under `build_dir` into `output_dir`.
///
/// The full set is discovered before the first copy, so an output directory
/// nested inside the build tree is never rescanned. Packages already sitting
/// in `output_dir` from an earlier run are left alone. Returns the collected
/// paths.
pub fn collect_artifacts(build_dir: &Path, output_dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let artifacts = find_artifacts(build_dir, suffix)?;

    fs::create_dir_all(output_dir).map_err(|source| BuildError::Filesystem {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut collected: Vec<PathBuf> = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let Some(name) = artifact.file_name() else {
            continue;
        };
        let dst = output_dir.join(name);

        if same_file(artifact, &dst) {
            tracing::debug!("{} is already collected", dst.display());
        } else {
            tracing::info!(
                "Collecting {}",
                relative_path(build_dir, artifact).display()
            );
            fs::copy(artifact, &dst).map_err(|source| BuildError::Filesystem {
                path: dst.clone(),
                source,
            })?;
        }

        if !collected.contains(&dst) {
            collected.push(dst);
        }
    }

    if collected.is_empty() {
        tracing::warn!("no .{} files found under {}", suffix, build_dir.display());
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collects_only_matching_files() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build");
        let out = tmp.path().join("out");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("a.pkg"), "a").unwrap();
        fs::write(build.join("b.pkg"), "b").unwrap();
        fs::write(build.join("c.txt"), "c").unwrap();

        let mut copied = collect_artifacts(&build, &out, "pkg").unwrap();
        copied.sort();

        assert_eq!(copied, vec![out.join("a.pkg"), out.join("b.pkg")]);
        assert!(!out.join("c.txt").exists());
        assert_eq!(fs::read_to_string(out.join("b.pkg")).unwrap(), "b");
    }

    #[test]
    fn test_collects_from_nested_directories() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build");
        let nested = build.join("_CPack_Packages/Linux/DEB");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("plugin_4.3.1_amd64.deb"), "").unwrap();
        fs::create_dir_all(build.join("dir.deb")).unwrap();

        let out = tmp.path().join("out/ubuntu_22");
        let copied = collect_artifacts(&build, &out, "deb").unwrap();

        assert_eq!(copied, vec![out.join("plugin_4.3.1_amd64.deb")]);
    }

    #[test]
    fn test_output_inside_build_tree() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().to_path_buf();
        fs::write(build.join("a.rpm"), "").unwrap();
        let out = build.join("packages");

        let copied = collect_artifacts(&build, &out, "rpm").unwrap();

        assert_eq!(copied, vec![out.join("a.rpm")]);
    }

    #[test]
    fn test_rerun_keeps_packages_already_in_output() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().to_path_buf();
        let out = build.join("packages/ubuntu_22");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("plugin.deb"), "PACKAGE BYTES").unwrap();

        let collected = collect_artifacts(&build, &out, "deb").unwrap();

        assert_eq!(collected, vec![out.join("plugin.deb")]);
        assert_eq!(fs::read_to_string(out.join("plugin.deb")).unwrap(), "PACKAGE BYTES");
    }

    #[test]
    fn test_second_collection_into_build_tree() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().to_path_buf();
        fs::write(build.join("plugin.deb"), "fresh").unwrap();
        let out = build.join("packages/ubuntu_22");

        collect_artifacts(&build, &out, "deb").unwrap();
        let collected = collect_artifacts(&build, &out, "deb").unwrap();

        assert_eq!(collected, vec![out.join("plugin.deb")]);
        assert_eq!(fs::read_to_string(out.join("plugin.deb")).unwrap(), "fresh");
    }

    #[test]
    fn test_uncreatable_output_is_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("a.rpm"), "").unwrap();
        let blocker = tmp.path().join("out");
        fs::write(&blocker, "not a directory").unwrap();
        let out = blocker.join("rocky_9");

        let err = collect_artifacts(&build, &out, "rpm").unwrap_err();

        match err.downcast_ref::<BuildError>() {
            Some(BuildError::Filesystem { path, .. }) => assert_eq!(path, &out),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failed_copy_is_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let build = tmp.path().join("build");
        fs::create_dir_all(&build).unwrap();
        fs::write(build.join("a.rpm"), "").unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(out.join("a.rpm")).unwrap();

        let err = collect_artifacts(&build, &out, "rpm").unwrap_err();

        match err.downcast_ref::<BuildError>() {
            Some(BuildError::Filesystem { path, .. }) => assert_eq!(path, &out.join("a.rpm")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
