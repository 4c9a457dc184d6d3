//! Configure and compile steps for the plugin's CMake project.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::errors::BuildError;
use crate::builder::toolchain::Environment;
use crate::util::config::BuildSettings;
use crate::util::process::{available_jobs, CommandOutput, CommandRunner, ProcessBuilder};

/// CMake build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    Debug,
    #[default]
    Release,
}

impl BuildMode {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            BuildMode::Debug
        } else {
            BuildMode::Release
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "Debug",
            BuildMode::Release => "Release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run one external build step, failing the pipeline on a nonzero exit.
pub fn run_step(runner: &dyn CommandRunner, step: &str, cmd: &ProcessBuilder) -> Result<CommandOutput> {
    tracing::info!("{}", cmd.display_command());
    let output = runner.run(cmd)?;
    if !output.is_success() {
        return Err(BuildError::SubprocessFailure {
            step: step.to_string(),
            command: cmd.display_command(),
            code: output.code,
            stderr: output.stderr,
        }
        .into());
    }
    if !output.stdout.is_empty() {
        tracing::debug!("{} output:\n{}", step, output.stdout.trim_end());
    }
    Ok(output)
}

/// CMake configure + package build for one source tree.
pub struct CMakeBuilder<'a> {
    settings: &'a BuildSettings,
    env: &'a Environment,
    source_dir: PathBuf,
    build_dir: PathBuf,
    mode: BuildMode,
    sanitizer: bool,
    jobs: usize,
}

impl<'a> CMakeBuilder<'a> {
    /// Create a new CMake builder.
    pub fn new(
        settings: &'a BuildSettings,
        env: &'a Environment,
        source_dir: PathBuf,
        build_dir: PathBuf,
    ) -> Self {
        CMakeBuilder {
            settings,
            env,
            source_dir,
            build_dir,
            mode: BuildMode::default(),
            sanitizer: false,
            jobs: available_jobs(),
        }
    }

    /// Set the build type.
    pub fn mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable the address sanitizer option.
    pub fn sanitizer(mut self, enabled: bool) -> Self {
        self.sanitizer = enabled;
        self
    }

    /// Override the compile parallelism.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// The configure step command line.
    pub fn configure_command(&self) -> Result<ProcessBuilder> {
        let mut cmd = self
            .env
            .command(&self.settings.configure_program)?
            .cwd(&self.build_dir)
            .arg(&self.source_dir)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.mode));

        if self.sanitizer {
            cmd = cmd.arg(format!("-D{}=YES", self.settings.sanitizer_option));
        }

        Ok(cmd)
    }

    /// The compile step command line.
    pub fn compile_command(&self) -> Result<ProcessBuilder> {
        Ok(self
            .env
            .command(&self.settings.build_program)?
            .cwd(&self.build_dir)
            .arg("-j")
            .arg(self.jobs.to_string())
            .arg(&self.settings.package_target))
    }

    /// Configure, then build packages. Stops at the first failing step.
    pub fn build(&self, runner: &dyn CommandRunner) -> Result<()> {
        for program in [&self.settings.configure_program, &self.settings.build_program] {
            match self.env.which(program) {
                Some(path) => tracing::debug!("using {}", path.display()),
                None => tracing::warn!("`{}` not found on the build search path", program),
            }
        }

        tracing::info!("Configuring {} build in {}", self.mode, self.build_dir.display());
        run_step(runner, "configure", &self.configure_command()?)?;

        tracing::info!("Building packages with {} jobs", self.jobs);
        run_step(runner, "compile", &self.compile_command()?)?;

        Ok(())
    }
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}
