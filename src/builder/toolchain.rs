//! Execution environment and pinned toolchain locations.
//!
//! Subprocesses never inherit a mutated process-wide `PATH`. Instead an
//! [`Environment`] value is captured once, adjusted, and applied to every
//! command the pipeline spawns.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::ToolchainSettings;
use crate::util::process::ProcessBuilder;

/// Search path handed to child processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    path: Vec<PathBuf>,
}

impl Environment {
    /// An environment with the given search path.
    pub fn new(path: Vec<PathBuf>) -> Self {
        Environment { path }
    }

    /// Capture the current process `PATH`.
    pub fn from_process() -> Self {
        let path = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();
        Environment::new(path)
    }

    /// Search path entries, highest precedence first.
    pub fn path(&self) -> &[PathBuf] {
        &self.path
    }

    /// Put `dir` at the front of the search path, dropping any later copy.
    pub fn prepend_path(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.path.retain(|p| p != &dir);
        self.path.insert(0, dir);
    }

    /// The search path joined for the `PATH` variable.
    pub fn path_var(&self) -> Result<OsString> {
        env::join_paths(&self.path).context("search path entry contains a path separator")
    }

    /// Resolve an executable against the search path.
    pub fn which(&self, name: &str) -> Option<PathBuf> {
        let path = self.path_var().ok()?;
        let cwd = env::current_dir().ok()?;
        which::which_in(name, Some(path), cwd).ok()
    }

    /// A process builder for `program` that runs under this environment.
    pub fn command(&self, program: impl AsRef<Path>) -> Result<ProcessBuilder> {
        let path = self.path_var()?;
        Ok(ProcessBuilder::new(program).env("PATH", path.to_string_lossy()))
    }
}

/// Install locations of the pinned compiler and configure tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPaths {
    pub compiler_bin: PathBuf,
    pub cmake_bin: PathBuf,
}

impl ToolchainPaths {
    pub fn from_settings(settings: &ToolchainSettings) -> Self {
        ToolchainPaths {
            compiler_bin: settings.externals_root.join(&settings.compiler).join("bin"),
            cmake_bin: settings.externals_root.join(&settings.cmake).join("bin"),
        }
    }
}

impl Default for ToolchainPaths {
    fn default() -> Self {
        Self::from_settings(&ToolchainSettings::default())
    }
}

/// Put the pinned toolchain ahead of anything else on the search path.
///
/// The compiler directory ends up first, the configure tool second.
pub fn configure_toolchain(env: &mut Environment, paths: &ToolchainPaths) {
    env.prepend_path(&paths.cmake_bin);
    env.prepend_path(&paths.compiler_bin);
    tracing::debug!(
        "search path: {}",
        env.path()
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":")
    );
}
