//! Build stages.
//!
//! Externals installation, the execution environment the build runs under,
//! the CMake configure/compile steps, and package collection.

pub mod artifacts;
pub mod cmake;
pub mod errors;
pub mod externals;
pub mod toolchain;

pub use cmake::{BuildMode, CMakeBuilder};
pub use errors::BuildError;
pub use externals::{ExternalsSource, EXTERNALS_MANIFEST};
pub use toolchain::{configure_toolchain, Environment, ToolchainPaths};
