//! Test utilities and mocks for unit tests.
//!
//! [`MockRunner`] stands in for real subprocesses and [`MockPackageManager`]
//! for the host packaging layer. Both record every call so tests can assert
//! on what the pipeline did, and in which order.
//!
//! # Example
//!
//! ```rust,ignore
//! use plugin_builder::test_support::{MockRunner, MockPackageManager};
//! use plugin_builder::util::process::CommandOutput;
//!
//! let runner = MockRunner::new();
//! runner.expect_prefix("make", CommandOutput::failure(2, "boom"));
//! let pm = MockPackageManager::new("ubuntu", "deb");
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use crate::platform::PackageManager;
use crate::util::process::{CommandOutput, CommandRunner, ProcessBuilder};

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
        }
    }
}

/// A command the runner was asked to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    /// Program and arguments joined by spaces.
    pub command: String,
    pub cwd: Option<PathBuf>,
    /// `PATH` override handed to the child, if any.
    pub path: Option<String>,
}

/// Mock command runner.
///
/// Commands with no matching expectation succeed with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    expectations: Mutex<Vec<(CommandPattern, CommandOutput)>>,
    calls: Mutex<Vec<RecordedCommand>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Return `output` for commands equal to `cmd`.
    pub fn expect(&self, cmd: &str, output: CommandOutput) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), output)
    }

    /// Return `output` for commands starting with `prefix`.
    pub fn expect_prefix(&self, prefix: &str, output: CommandOutput) -> &Self {
        self.push(CommandPattern::StartsWith(prefix.to_string()), output)
    }

    fn push(&self, pattern: CommandPattern, output: CommandOutput) -> &Self {
        self.expectations.lock().unwrap().push((pattern, output));
        self
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<CommandOutput> {
        let command = cmd.display_command();
        self.calls.lock().unwrap().push(RecordedCommand {
            command: command.clone(),
            cwd: cmd.get_cwd().map(Path::to_path_buf),
            path: cmd.get_env("PATH").map(str::to_string),
        });

        let expectations = self.expectations.lock().unwrap();
        Ok(expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&command))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::success("")))
    }
}

/// A call made against [`MockPackageManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageCall {
    ProjectRepository,
    ByName(Vec<String>),
    FromFiles(Vec<PathBuf>),
}

/// Mock packaging layer that records calls instead of installing.
#[derive(Debug)]
pub struct MockPackageManager {
    distribution: String,
    suffix: String,
    os_directory: String,
    calls: Mutex<Vec<PackageCall>>,
}

impl MockPackageManager {
    /// `os_specific_subdirectory` appends `<distribution>_test`.
    pub fn new(distribution: &str, suffix: &str) -> Self {
        MockPackageManager {
            distribution: distribution.to_string(),
            suffix: suffix.to_string(),
            os_directory: format!("{}_test", distribution),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<PackageCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Name of the OS-specific subdirectory.
    pub fn os_directory(&self) -> &str {
        &self.os_directory
    }

    fn record(&self, call: PackageCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl PackageManager for MockPackageManager {
    fn distribution(&self) -> &str {
        &self.distribution
    }

    fn package_suffix(&self) -> &str {
        &self.suffix
    }

    fn os_specific_subdirectory(&self, base: &Path) -> PathBuf {
        base.join(&self.os_directory)
    }

    fn install_project_repository(&self) -> Result<()> {
        self.record(PackageCall::ProjectRepository)
    }

    fn install_packages_by_name(&self, names: &[String]) -> Result<()> {
        self.record(PackageCall::ByName(names.to_vec()))
    }

    fn install_packages_from_files(&self, paths: &[PathBuf]) -> Result<()> {
        self.record(PackageCall::FromFiles(paths.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_runner_defaults_to_success() {
        let runner = MockRunner::new();
        let output = runner.run(&ProcessBuilder::new("cmake").arg("..")).unwrap();
        assert!(output.is_success());
        assert_eq!(runner.commands(), vec!["cmake .."]);
    }

    #[test]
    fn test_mock_runner_first_matching_expectation_wins() {
        let runner = MockRunner::new();
        runner
            .expect("make -j 2 package", CommandOutput::failure(2, "error"))
            .expect_prefix("make", CommandOutput::success("ok"));

        let out = runner
            .run(&ProcessBuilder::new("make").args(["-j", "2", "package"]))
            .unwrap();
        assert_eq!(out.code, Some(2));

        let out = runner.run(&ProcessBuilder::new("make").arg("all")).unwrap();
        assert_eq!(out.stdout, "ok");
    }
}
