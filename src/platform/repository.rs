//! Registration of the project package repository.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::util::config::RepositorySettings;
use crate::util::fs::ensure_dir;
use crate::util::process::{CommandRunner, ProcessBuilder};

use super::{OsRelease, PackageTool};

/// `sources.list` entry for an apt repository.
pub fn apt_source_line(base_url: &str, codename: &str) -> String {
    format!("deb [arch=amd64] {}/apt/ {} main\n", base_url, codename)
}

/// INI repo definition understood by both yum and zypper.
pub fn rpm_repo_file(settings: &RepositorySettings, base_url: &str, major: &str) -> String {
    format!(
        "[{name}]\n\
         name={name}\n\
         baseurl={base}/yum/pool/el{major}/$basearch\n\
         enabled=1\n\
         gpgcheck=1\n\
         gpgkey={key}\n",
        name = settings.name,
        base = base_url,
        major = major,
        key = settings.signing_key,
    )
}

/// Where the repository definition is written for `tool`.
pub fn repo_definition_path(settings: &RepositorySettings, tool: PackageTool) -> PathBuf {
    let root = &settings.sysconf_root;
    match tool {
        PackageTool::Apt => root
            .join("apt/sources.list.d")
            .join(format!("{}.list", settings.name)),
        PackageTool::Yum => root
            .join("yum.repos.d")
            .join(format!("{}.repo", settings.name)),
        PackageTool::Zypper => root
            .join("zypp/repos.d")
            .join(format!("{}.repo", settings.name)),
    }
}

/// Register the repository with the host package tool.
pub fn register(
    settings: &RepositorySettings,
    release: &OsRelease,
    tool: PackageTool,
    runner: &dyn CommandRunner,
) -> Result<()> {
    let base_url = settings.base_url()?;
    let definition = repo_definition_path(settings, tool);

    match tool {
        PackageTool::Apt => {
            let codename = release
                .version_codename
                .as_deref()
                .context("os-release has no VERSION_CODENAME; cannot add apt repository")?;
            let key_path = settings
                .sysconf_root
                .join("apt/trusted.gpg.d")
                .join(format!("{}.asc", settings.name));
            let key = fetch_signing_key(settings)?;
            write_file(&key_path, &key)?;
            write_file(&definition, &apt_source_line(&base_url, codename))?;
            runner.run_checked(&ProcessBuilder::new("apt-get").arg("update"))?;
        }
        PackageTool::Yum | PackageTool::Zypper => {
            runner.run_checked(
                &ProcessBuilder::new("rpm")
                    .arg("--import")
                    .arg(settings.signing_key_url()?.as_str()),
            )?;
            write_file(
                &definition,
                &rpm_repo_file(settings, &base_url, release.major_version()),
            )?;
        }
    }

    tracing::info!("Registered repository `{}` at {}", settings.name, base_url);
    Ok(())
}

fn fetch_signing_key(settings: &RepositorySettings) -> Result<String> {
    let url = settings.signing_key_url()?;
    tracing::debug!("fetching signing key from {}", url);
    reqwest::blocking::get(url.clone())
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .with_context(|| format!("failed to download signing key from {}", url))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))
}
