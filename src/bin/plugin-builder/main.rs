//! plugin-builder CLI - builds the plugin's native packages on a CI host

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use plugin_builder::builder::{BuildMode, Environment, ExternalsSource};
use plugin_builder::ops::{build_plugin, BuildOptions};
use plugin_builder::platform::{InstallationPlan, OsRelease, SystemPackageManager};
use plugin_builder::util::config::{global_config_path, load_config, project_config_path, Config};
use plugin_builder::util::process::SystemRunner;

mod cli;

use cli::Cli;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

/// CI jobs pass the literal string `None` for an unset directory.
fn optional_dir(dir: Option<PathBuf>) -> Option<PathBuf> {
    dir.filter(|d| d.as_os_str() != "None")
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("plugin_builder=debug")
    } else {
        EnvFilter::new("plugin_builder=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => load_config(
            global_config_path().as_deref(),
            &project_config_path(&cli.source_directory),
        ),
    };

    let release = OsRelease::load(cli.os_release.as_deref())?;
    let plan = InstallationPlan::resolve(release.distribution())?;
    let pm = SystemPackageManager::new(release, plan.family, config.repository.clone());

    let opts = BuildOptions {
        source_dir: cli.source_directory,
        build_dir: optional_dir(cli.build_directory),
        output_root: optional_dir(cli.output_root_directory),
        host_packages_dir: optional_dir(cli.irods_packages_root_directory),
        externals: ExternalsSource::from_option(optional_dir(cli.externals_packages_directory)),
        mode: BuildMode::from_debug_flag(cli.debug_build),
        sanitizer: cli.enable_address_sanitizer,
    };

    let mut env = Environment::from_process();
    let result = build_plugin(&opts, &config, &pm, &SystemRunner, &mut env)?;

    eprintln!("    Finished build in {}", result.build_dir.display());
    for artifact in &result.artifacts {
        eprintln!("    Packaged {}", artifact.display());
    }

    Ok(())
}
