//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Build the plugin and collect its packages
#[derive(Parser)]
#[command(name = "plugin-builder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Build directory (a temporary directory is created when omitted)
    #[arg(long, alias = "build_directory", value_name = "DIR")]
    pub build_directory: Option<PathBuf>,

    /// Copy produced packages under this directory
    #[arg(long, alias = "output_root_directory", value_name = "DIR")]
    pub output_root_directory: Option<PathBuf>,

    /// Install the host's runtime and development packages from this directory
    #[arg(long, alias = "irods_packages_root_directory", value_name = "DIR")]
    pub irods_packages_root_directory: Option<PathBuf>,

    /// Install externals from package files in this directory instead of the repository
    #[arg(long, alias = "externals_packages_directory", value_name = "DIR")]
    pub externals_packages_directory: Option<PathBuf>,

    /// Build in Debug mode instead of Release
    #[arg(long, alias = "debug_build")]
    pub debug_build: bool,

    /// Enable the address sanitizer
    #[arg(long)]
    pub enable_address_sanitizer: bool,

    /// Root of the plugin source tree
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_directory: PathBuf,

    /// Use this config file instead of the global and project ones
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read the distribution from this os-release file
    #[arg(long, value_name = "FILE", env = "PLUGIN_BUILDER_OS_RELEASE", hide = true)]
    pub os_release: Option<PathBuf>,
}
