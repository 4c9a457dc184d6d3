//! `os-release` parsing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Standard locations, in lookup order.
pub const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// The fields of an `os-release` file the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OsRelease {
    /// Lowercase distribution id (`ID=`), e.g. `ubuntu`, `rocky`
    pub id: String,
    /// Human readable name (`NAME=`)
    pub name: String,
    /// Version (`VERSION_ID=`), e.g. `22.04`, `9.3`
    pub version_id: String,
    /// Release codename (`VERSION_CODENAME=`), Debian family only
    pub version_codename: Option<String>,
}

impl OsRelease {
    /// Parse the contents of an `os-release` file.
    pub fn parse(contents: &str) -> Self {
        let mut fields = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                fields.insert(key.trim(), unquote(value.trim()));
            }
        }

        let mut take = |key: &str| fields.remove(key).unwrap_or_default();
        let id = take("ID");
        let name = take("NAME");
        let version_id = take("VERSION_ID");
        let version_codename = Some(take("VERSION_CODENAME")).filter(|c| !c.is_empty());

        OsRelease {
            id,
            name,
            version_id,
            version_codename,
        }
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::parse(&contents))
    }

    /// Load the host's `os-release`, preferring `override_path` when given.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            return Self::from_file(path);
        }

        let path = OS_RELEASE_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .context("cannot identify distribution: no os-release file found")?;
        Self::from_file(&path)
    }

    /// Canonical distribution identifier, used to pick an install routine.
    pub fn distribution(&self) -> &str {
        if self.id.is_empty() {
            &self.name
        } else {
            &self.id
        }
    }

    /// Leading component of the version, e.g. `22` for `22.04`.
    pub fn major_version(&self) -> &str {
        self.version_id
            .split('.')
            .next()
            .unwrap_or(&self.version_id)
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    stripped.replace("\\\"", "\"")
}
