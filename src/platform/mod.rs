//! Host platform detection and package installation.
//!
//! The distribution identifier reported by `os-release` is dispatched onto a
//! fixed set of platform families. Each family knows its package format, the
//! tool that installs packages, and the runtime libraries a plugin build needs.
//! Unknown distributions are a first-class [`Dispatch::Unsupported`] outcome;
//! [`InstallationPlan::resolve`] turns that into a fatal error.

pub mod os_release;
pub mod package_manager;
pub mod repository;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::errors::BuildError;

pub use os_release::OsRelease;
pub use package_manager::SystemPackageManager;

/// A supported family of distributions sharing one install routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    /// Ubuntu, Debian
    Debian,
    /// AlmaLinux, CentOS, Rocky Linux
    RedHat,
    /// openSUSE
    Suse,
}

/// Result of looking a distribution up in the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Routine(PlatformFamily),
    Unsupported { distribution: String },
}

impl PlatformFamily {
    /// Select the family for a distribution identifier.
    ///
    /// Accepts both `os-release` ids (`rocky`) and distribution names
    /// (`Rocky Linux`, `Debian GNU_Linux`); matching ignores case and
    /// surrounding whitespace.
    pub fn dispatch(distribution: &str) -> Dispatch {
        let key = distribution.trim().to_lowercase().replace('_', "/");
        let family = match key.as_str() {
            "ubuntu" | "debian" | "debian gnu/linux" => PlatformFamily::Debian,
            "almalinux" | "centos" | "centos linux" | "rocky" | "rocky linux" => {
                PlatformFamily::RedHat
            }
            "opensuse" | "opensuse-leap" | "opensuse-tumbleweed" => PlatformFamily::Suse,
            _ => {
                return Dispatch::Unsupported {
                    distribution: distribution.to_string(),
                }
            }
        };
        Dispatch::Routine(family)
    }

    /// Native package format of the family.
    pub fn package_format(&self) -> PackageFormat {
        match self {
            PlatformFamily::Debian => PackageFormat::Deb,
            PlatformFamily::RedHat | PlatformFamily::Suse => PackageFormat::Rpm,
        }
    }

    /// Tool used to install packages.
    pub fn package_tool(&self) -> PackageTool {
        match self {
            PlatformFamily::Debian => PackageTool::Apt,
            PlatformFamily::RedHat => PackageTool::Yum,
            PlatformFamily::Suse => PackageTool::Zypper,
        }
    }

    /// Development libraries the plugin links against, by family.
    pub fn runtime_packages(&self) -> &'static [&'static str] {
        match self {
            PlatformFamily::Debian => &["libcurl4-gnutls-dev", "make", "libssl-dev", "gcc"],
            PlatformFamily::RedHat | PlatformFamily::Suse => {
                &["make", "curl-devel", "openssl-devel"]
            }
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformFamily::Debian => "debian",
            PlatformFamily::RedHat => "redhat",
            PlatformFamily::Suse => "suse",
        };
        f.write_str(name)
    }
}

/// The install routine chosen for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationPlan {
    pub distribution: String,
    pub family: PlatformFamily,
}

impl InstallationPlan {
    /// Dispatch `distribution`, failing with `UnsupportedPlatform` on a miss.
    pub fn resolve(distribution: &str) -> Result<Self> {
        match PlatformFamily::dispatch(distribution) {
            Dispatch::Routine(family) => Ok(InstallationPlan {
                distribution: distribution.to_string(),
                family,
            }),
            Dispatch::Unsupported { distribution } => {
                Err(BuildError::UnsupportedPlatform { distribution }.into())
            }
        }
    }

    /// Install the family's runtime development libraries.
    pub fn install_runtime_packages(&self, pm: &dyn PackageManager) -> Result<()> {
        let names: Vec<String> = self
            .family
            .runtime_packages()
            .iter()
            .map(|s| s.to_string())
            .collect();
        tracing::info!("Installing {} runtime packages", self.family);
        pm.install_packages_by_name(&names)
    }
}

/// Host package file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFormat {
    Deb,
    Rpm,
}

impl PackageFormat {
    /// File extension, without the dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            PackageFormat::Deb => "deb",
            PackageFormat::Rpm => "rpm",
        }
    }
}

/// Whether `file_name` ends with `.<suffix>`.
pub fn matches_suffix(file_name: &str, suffix: &str) -> bool {
    file_name
        .strip_suffix(suffix)
        .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
}

/// Package installation front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageTool {
    Apt,
    Yum,
    Zypper,
}

impl PackageTool {
    /// Command installing packages by repository name.
    pub fn install_by_name_args(&self, names: &[String]) -> (&'static str, Vec<String>) {
        let mut args: Vec<String> = match self {
            PackageTool::Apt => vec!["install".into(), "-y".into()],
            PackageTool::Yum => vec!["install".into(), "-y".into()],
            PackageTool::Zypper => vec!["--non-interactive".into(), "install".into()],
        };
        args.extend(names.iter().cloned());
        (self.program(), args)
    }

    /// Command installing local package files in one transaction.
    pub fn install_files_args(&self, paths: &[PathBuf]) -> (&'static str, Vec<String>) {
        let mut args: Vec<String> = match self {
            PackageTool::Apt => vec!["install".into(), "-y".into()],
            PackageTool::Yum => vec!["install".into(), "-y".into()],
            PackageTool::Zypper => vec![
                "--non-interactive".into(),
                "--no-gpg-checks".into(),
                "install".into(),
            ],
        };
        args.extend(paths.iter().map(|p| p.display().to_string()));
        (self.program(), args)
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageTool::Apt => "apt-get",
            PackageTool::Yum => "yum",
            PackageTool::Zypper => "zypper",
        }
    }
}

/// The operating-system packaging layer the pipeline drives.
pub trait PackageManager {
    /// Canonical identifier of the running distribution.
    fn distribution(&self) -> &str;

    /// Host package file extension, without the dot.
    fn package_suffix(&self) -> &str;

    /// `base` extended with the directory used for this OS's packages.
    fn os_specific_subdirectory(&self, base: &Path) -> PathBuf;

    /// Register the project's package repository.
    fn install_project_repository(&self) -> Result<()>;

    fn install_packages_by_name(&self, names: &[String]) -> Result<()>;

    fn install_packages_from_files(&self, paths: &[PathBuf]) -> Result<()>;
}
