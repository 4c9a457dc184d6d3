//! Package installation through the host's native package tool.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::config::RepositorySettings;
use crate::util::process::{CommandRunner, ProcessBuilder, SystemRunner};

use super::{repository, OsRelease, PackageManager, PackageTool, PlatformFamily};

/// [`PackageManager`] backed by apt, yum or zypper.
///
/// The tool and package format follow the family the host was dispatched to
/// by [`InstallationPlan::resolve`](super::InstallationPlan::resolve).
#[derive(Debug)]
pub struct SystemPackageManager<R: CommandRunner = SystemRunner> {
    release: OsRelease,
    tool: PackageTool,
    suffix: &'static str,
    repository: RepositorySettings,
    runner: R,
}

impl SystemPackageManager<SystemRunner> {
    pub fn new(release: OsRelease, family: PlatformFamily, repository: RepositorySettings) -> Self {
        Self::with_runner(release, family, repository, SystemRunner)
    }
}

impl<R: CommandRunner> SystemPackageManager<R> {
    pub fn with_runner(
        release: OsRelease,
        family: PlatformFamily,
        repository: RepositorySettings,
        runner: R,
    ) -> Self {
        SystemPackageManager {
            tool: family.package_tool(),
            suffix: family.package_format().suffix(),
            release,
            repository,
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn run(&self, (program, args): (&str, Vec<String>)) -> Result<()> {
        let cmd = ProcessBuilder::new(program).args(args);
        tracing::info!("{}", cmd.display_command());
        self.runner.run_checked(&cmd)?;
        Ok(())
    }
}

impl<R: CommandRunner> PackageManager for SystemPackageManager<R> {
    fn distribution(&self) -> &str {
        self.release.distribution()
    }

    fn package_suffix(&self) -> &str {
        self.suffix
    }

    /// `<base>/<id>_<major version>`, e.g. `packages/ubuntu_22`.
    fn os_specific_subdirectory(&self, base: &Path) -> PathBuf {
        base.join(format!(
            "{}_{}",
            self.release.distribution().to_lowercase().replace(' ', "_"),
            self.release.major_version()
        ))
    }

    fn install_project_repository(&self) -> Result<()> {
        repository::register(&self.repository, &self.release, self.tool, &self.runner)
    }

    fn install_packages_by_name(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }
        self.run(self.tool.install_by_name_args(names))
    }

    fn install_packages_from_files(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.run(self.tool.install_files_args(paths))
    }
}
