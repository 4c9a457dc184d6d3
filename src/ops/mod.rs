//! High-level operations.

pub mod plugin_build;

pub use plugin_build::{build_plugin, BuildOptions, BuildResult};
