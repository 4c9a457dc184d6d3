//! Configuration file support.
//!
//! Two locations are consulted:
//! - Global: `<user config dir>/plugin-builder/config.toml` - host-wide defaults
//! - Project: `<source root>/.plugin-builder.toml` - per-plugin overrides
//!
//! Project config takes precedence over global config. Every field has a
//! default, so a missing file is never an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use url::Url;

/// File name of the per-project configuration.
pub const PROJECT_CONFIG_FILE: &str = ".plugin-builder.toml";

/// Builder configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pinned toolchain locations
    pub toolchain: ToolchainSettings,

    /// Project package repository
    pub repository: RepositorySettings,

    /// Configure/compile step settings
    pub build: BuildSettings,
}

/// Where the pinned compiler and configure tool are installed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Root that externals packages install into
    pub externals_root: PathBuf,

    /// Directory name of the pinned compiler under `externals_root`
    pub compiler: String,

    /// Directory name of the pinned CMake under `externals_root`
    pub cmake: String,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        ToolchainSettings {
            externals_root: PathBuf::from("/opt/irods-externals"),
            compiler: "clang13.0.1-0".to_string(),
            cmake: "cmake3.21.4-0".to_string(),
        }
    }
}

/// The project's package repository, registered in repository mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Repository name, used for the source list / repo file names
    pub name: String,

    /// Base URL of the repository
    pub url: String,

    /// URL of the ASCII-armored signing key
    pub signing_key: String,

    /// Root of the system configuration tree
    pub sysconf_root: PathBuf,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        RepositorySettings {
            name: "renci-irods".to_string(),
            url: "https://packages.irods.org".to_string(),
            signing_key: "https://packages.irods.org/irods-signing-key.asc".to_string(),
            sysconf_root: PathBuf::from("/etc"),
        }
    }
}

impl RepositorySettings {
    /// Parsed base URL, without a trailing slash.
    pub fn base_url(&self) -> Result<String> {
        let url = Url::parse(&self.url)
            .with_context(|| format!("invalid repository url: {}", self.url))?;
        Ok(url.as_str().trim_end_matches('/').to_string())
    }

    /// Parsed signing key URL.
    pub fn signing_key_url(&self) -> Result<Url> {
        Url::parse(&self.signing_key)
            .with_context(|| format!("invalid signing key url: {}", self.signing_key))
    }
}

/// Settings for the configure and compile steps.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Configure tool invoked in the build directory
    pub configure_program: String,

    /// Compile tool invoked in the build directory
    pub build_program: String,

    /// Compile-tool target that produces packages
    pub package_target: String,

    /// Cache variable set to `YES` when the sanitizer is enabled
    pub sanitizer_option: String,

    /// Prefix for generated temporary build directories
    pub temp_prefix: String,

    /// Host project packages installed from `--irods-packages-root-directory`
    pub host_packages: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            configure_program: "cmake".to_string(),
            build_program: "make".to_string(),
            package_target: "package".to_string(),
            sanitizer_option: "IRODS_ENABLE_ADDRESS_SANITIZER".to_string(),
            temp_prefix: "irods_storage_tiering_plugin_build_directory".to_string(),
            host_packages: vec!["irods-runtime".to_string(), "irods-dev".to_string()],
        }
    }
}

/// Partial configuration as written in a file; absent keys leave the base untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    toolchain: ToolchainOverlay,
    repository: RepositoryOverlay,
    build: BuildOverlay,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ToolchainOverlay {
    externals_root: Option<PathBuf>,
    compiler: Option<String>,
    cmake: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RepositoryOverlay {
    name: Option<String>,
    url: Option<String>,
    signing_key: Option<String>,
    sysconf_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct BuildOverlay {
    configure_program: Option<String>,
    build_program: Option<String>,
    package_target: Option<String>,
    sanitizer_option: Option<String>,
    temp_prefix: Option<String>,
    host_packages: Option<Vec<String>>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Config {
    /// Load configuration from a file, on top of the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Config::default();
        config.merge_file(path)?;
        Ok(config)
    }

    /// Apply the keys present in `path` on top of this config.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let overlay: ConfigOverlay = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;

        self.merge(overlay);
        Ok(())
    }

    fn merge(&mut self, other: ConfigOverlay) {
        let tc = other.toolchain;
        set(&mut self.toolchain.externals_root, tc.externals_root);
        set(&mut self.toolchain.compiler, tc.compiler);
        set(&mut self.toolchain.cmake, tc.cmake);

        let repo = other.repository;
        set(&mut self.repository.name, repo.name);
        set(&mut self.repository.url, repo.url);
        set(&mut self.repository.signing_key, repo.signing_key);
        set(&mut self.repository.sysconf_root, repo.sysconf_root);

        let build = other.build;
        set(&mut self.build.configure_program, build.configure_program);
        set(&mut self.build.build_program, build.build_program);
        set(&mut self.build.package_target, build.package_target);
        set(&mut self.build.sanitizer_option, build.sanitizer_option);
        set(&mut self.build.temp_prefix, build.temp_prefix);
        set(&mut self.build.host_packages, build.host_packages);
    }

    /// Merge `path` if it exists; a broken file is reported and skipped.
    fn merge_if_exists(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        let mut merged = self.clone();
        match merged.merge_file(path) {
            Ok(()) => *self = merged,
            Err(e) => tracing::warn!("Failed to load config from {}: {:#}", path.display(), e),
        }
    }
}

/// Path of the global config file, if the platform has a config directory.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "irods", "plugin-builder")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the project config file for a plugin source root.
pub fn project_config_path(source_dir: &Path) -> PathBuf {
    source_dir.join(PROJECT_CONFIG_FILE)
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge_if_exists(global);
    }

    config.merge_if_exists(project_path);

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(
            config.toolchain.externals_root,
            PathBuf::from("/opt/irods-externals")
        );
        assert_eq!(config.build.configure_program, "cmake");
        assert_eq!(config.build.host_packages, vec!["irods-runtime", "irods-dev"]);
    }

    #[test]
    fn test_config_load_partial() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[toolchain]
compiler = "clang16.0.6-0"

[build]
build_program = "gmake"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.toolchain.compiler, "clang16.0.6-0");
        assert_eq!(config.toolchain.cmake, "cmake3.21.4-0");
        assert_eq!(config.build.build_program, "gmake");
        assert_eq!(config.build.configure_program, "cmake");
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[repository]
url = "https://mirror.example.org"
name = "mirror"
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[repository]
name = "local-mirror"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);

        assert_eq!(config.repository.name, "local-mirror");
        assert_eq!(config.repository.url, "https://mirror.example.org");
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let project_path = tmp.path().join("project.toml");
        std::fs::write(&project_path, "[build\nbroken").unwrap();

        let config = load_config(None, &project_path);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_repository_base_url() {
        let mut repo = RepositorySettings::default();
        assert_eq!(repo.base_url().unwrap(), "https://packages.irods.org");

        repo.url = "not a url".to_string();
        assert!(repo.base_url().is_err());
    }
}
