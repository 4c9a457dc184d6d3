//! Implementation of the plugin build pipeline.
//!
//! Stages run strictly in order and the first failure aborts the run:
//! platform dispatch, externals installation, toolchain search path,
//! runtime libraries, host packages, configure, compile, collection.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::artifacts::collect_artifacts;
use crate::builder::cmake::{is_cmake_project, BuildMode, CMakeBuilder};
use crate::builder::errors::BuildError;
use crate::builder::externals::{install_externals, install_host_packages, ExternalsSource};
use crate::builder::toolchain::{configure_toolchain, Environment, ToolchainPaths};
use crate::platform::{InstallationPlan, PackageManager};
use crate::util::config::Config;
use crate::util::fs::absolute;
use crate::util::process::CommandRunner;

/// Caller-supplied parameters for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Root of the plugin's CMake project
    pub source_dir: PathBuf,

    /// Build directory; a fresh temporary directory when `None`
    pub build_dir: Option<PathBuf>,

    /// Where collected packages go; collection is skipped when `None`
    pub output_root: Option<PathBuf>,

    /// Directory of prebuilt host runtime/development packages
    pub host_packages_dir: Option<PathBuf>,

    /// Repository or local directory for externals
    pub externals: ExternalsSource,

    pub mode: BuildMode,

    /// Pass the address sanitizer option to the configure step
    pub sanitizer: bool,
}

impl BuildOptions {
    /// Release build of `source_dir` with externals from the repository.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        BuildOptions {
            source_dir: source_dir.into(),
            build_dir: None,
            output_root: None,
            host_packages_dir: None,
            externals: ExternalsSource::Repository,
            mode: BuildMode::Release,
            sanitizer: false,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    /// The build directory used; temporary ones are left on disk.
    pub build_dir: PathBuf,

    /// Packages copied into the output directory.
    pub artifacts: Vec<PathBuf>,
}

/// Use the caller's build directory, or create a uniquely named temporary one.
///
/// A caller directory is created if missing and otherwise left as is.
pub fn resolve_build_dir(requested: Option<&Path>, temp_prefix: &str) -> Result<PathBuf> {
    match requested {
        Some(dir) => {
            let dir = absolute(dir)?;
            std::fs::create_dir_all(&dir).map_err(|source| BuildError::Filesystem {
                path: dir.clone(),
                source,
            })?;
            Ok(dir)
        }
        None => {
            let tmp = tempfile::Builder::new()
                .prefix(temp_prefix)
                .keep(true)
                .tempdir()
                .map_err(|source| BuildError::Filesystem {
                    path: std::env::temp_dir(),
                    source,
                })?;
            Ok(tmp.path().to_path_buf())
        }
    }
}

/// Run the full pipeline.
///
/// `env` receives the toolchain search path and is what every build
/// subprocess runs under.
pub fn build_plugin(
    opts: &BuildOptions,
    config: &Config,
    pm: &dyn PackageManager,
    runner: &dyn CommandRunner,
    env: &mut Environment,
) -> Result<BuildResult> {
    let plan = InstallationPlan::resolve(pm.distribution())?;
    tracing::info!("Detected `{}` ({} family)", plan.distribution, plan.family);

    install_externals(pm, &opts.externals)?;
    configure_toolchain(env, &ToolchainPaths::from_settings(&config.toolchain));
    plan.install_runtime_packages(pm)?;

    if let Some(dir) = &opts.host_packages_dir {
        install_host_packages(pm, dir, &config.build.host_packages)?;
    }

    let source_dir = absolute(&opts.source_dir)?;
    if !is_cmake_project(&source_dir) {
        tracing::warn!("no CMakeLists.txt in {}", source_dir.display());
    }

    let build_dir = resolve_build_dir(opts.build_dir.as_deref(), &config.build.temp_prefix)?;

    CMakeBuilder::new(&config.build, env, source_dir, build_dir.clone())
        .mode(opts.mode)
        .sanitizer(opts.sanitizer)
        .build(runner)?;

    let artifacts = match &opts.output_root {
        Some(root) => {
            let output_dir = pm.os_specific_subdirectory(&absolute(root)?);
            collect_artifacts(&build_dir, &output_dir, pm.package_suffix())?
        }
        None => Vec::new(),
    };

    Ok(BuildResult {
        build_dir,
        artifacts,
    })
}
