//! plugin-builder - builds and packages an iRODS plugin on a CI build host
//!
//! This crate provides the pipeline behind the `plugin-builder` binary:
//! platform dispatch, externals installation, the CMake configure and
//! package steps, and collection of the produced packages.

pub mod builder;
pub mod ops;
pub mod platform;
pub mod util;

/// Recording mocks for the package manager and subprocess seams.
///
/// Only available when compiling tests.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildError, BuildMode, Environment, ExternalsSource};
pub use ops::{build_plugin, BuildOptions, BuildResult};
pub use platform::{InstallationPlan, OsRelease, PackageManager, SystemPackageManager};
pub use util::config::Config;
