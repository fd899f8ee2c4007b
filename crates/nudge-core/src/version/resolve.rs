//! Base-version resolution.
//!
//! The version a bump starts from is taken from the first source that yields
//! a valid semver, in this order:
//!
//! 1. an explicit `--base` argument
//! 2. the newest git tag that parses as a version (skipped in gitless mode)
//! 3. the nearest `package.json` `version` field
//! 4. the nearest `pyproject.toml` (`project.version`, then `tool.poetry.version`)
//! 5. `0.0.0`
//!
//! Invalid values in sources 2-4 are skipped, never fatal.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{VersionError, VersionResult, parse_version};
use crate::format::{PACKAGE_JSON, PYPROJECT_TOML};
use crate::git::TagSource;

/// What to do in gitless mode when no file provides a version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Fail with [`VersionError::NoVersionFound`].
    #[default]
    Fail,
    /// Start from `0.0.0`.
    Zero,
}

/// Inputs to [`resolve_base_version`].
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// Version given on the command line, if any.
    pub explicit_base: Option<&'a str>,
    /// Skip git tags entirely.
    pub gitless: bool,
    /// Directory the manifest search starts from.
    pub project_root: &'a Utf8Path,
    /// Prefix stripped from tag names before parsing (e.g. `v`).
    pub tag_prefix: &'a str,
    /// Gitless fallback behavior.
    pub fallback: FallbackPolicy,
}

/// Where the base version came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "from", rename_all = "lowercase")]
pub enum VersionSource {
    /// The `--base` argument.
    Explicit,
    /// A git tag.
    Tag(String),
    /// A `package.json` file.
    Manifest(Utf8PathBuf),
    /// A `pyproject.toml` file.
    Descriptor(Utf8PathBuf),
    /// Nothing found; started from `0.0.0`.
    Default,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => write!(f, "--base"),
            Self::Tag(tag) => write!(f, "tag {tag}"),
            Self::Manifest(path) | Self::Descriptor(path) => write!(f, "{path}"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A resolved base version and its origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    /// The base version.
    pub version: Version,
    /// Where it was found.
    pub source: VersionSource,
}

/// Determine the version this invocation bumps from.
#[instrument(skip_all, fields(root = %request.project_root, gitless = request.gitless))]
pub fn resolve_base_version(
    request: &ResolveRequest<'_>,
    tags: &dyn TagSource,
) -> VersionResult<ResolvedVersion> {
    if let Some(base) = request.explicit_base {
        let version = parse_version(base)?;
        debug!(%version, "using explicit base version");
        return Ok(ResolvedVersion {
            version,
            source: VersionSource::Explicit,
        });
    }

    if !request.gitless
        && let Some((tag, version)) = latest_tag_version(tags, request.tag_prefix)
    {
        debug!(%tag, %version, "base version from tag");
        return Ok(ResolvedVersion {
            version,
            source: VersionSource::Tag(tag),
        });
    }

    if let Some(path) = find_nearest(request.project_root, PACKAGE_JSON)
        && let Some(version) = manifest_version(&path)
    {
        debug!(%path, %version, "base version from manifest");
        return Ok(ResolvedVersion {
            version,
            source: VersionSource::Manifest(path),
        });
    }

    if let Some(path) = find_nearest(request.project_root, PYPROJECT_TOML)
        && let Some(version) = descriptor_version(&path)
    {
        debug!(%path, %version, "base version from project descriptor");
        return Ok(ResolvedVersion {
            version,
            source: VersionSource::Descriptor(path),
        });
    }

    if request.gitless && request.fallback == FallbackPolicy::Fail {
        return Err(VersionError::NoVersionFound);
    }

    debug!("no version source found, starting from 0.0.0");
    Ok(ResolvedVersion {
        version: Version::new(0, 0, 0),
        source: VersionSource::Default,
    })
}

/// The newest tag whose name minus `prefix` is semver.
///
/// A tag without the prefix may carry a single leading `v` instead.
fn latest_tag_version(tags: &dyn TagSource, prefix: &str) -> Option<(String, Version)> {
    let names = match tags.tags_newest_first() {
        Ok(names) => names,
        Err(e) => {
            debug!(error = %e, "tag listing unavailable");
            return None;
        }
    };

    names.into_iter().find_map(|name| {
        let version = match name.strip_prefix(prefix) {
            Some(stripped) => Version::parse(stripped).ok()?,
            None => parse_version(&name).ok()?,
        };
        Some((name, version))
    })
}

/// Walk up from `start` to find the nearest file called `name`.
pub fn find_nearest(start: &Utf8Path, name: &str) -> Option<Utf8PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// The top-level `version` of a `package.json`, if present and valid.
pub fn manifest_version(path: &Utf8Path) -> Option<Version> {
    let content = read(path)?;
    let json: serde_json::Value = match serde_json::from_str(&content) {
        Ok(json) => json,
        Err(e) => {
            warn!(%path, error = %e, "skipping unparseable manifest");
            return None;
        }
    };
    let raw = json.get("version")?.as_str()?;
    valid_or_skip(path, raw)
}

/// The version declared by a `pyproject.toml`, if present and valid.
///
/// `[project] version` is checked before `[tool.poetry] version`.
pub fn descriptor_version(path: &Utf8Path) -> Option<Version> {
    let content = read(path)?;
    let table: toml::Table = match content.parse() {
        Ok(table) => table,
        Err(e) => {
            warn!(%path, error = %e, "skipping unparseable project descriptor");
            return None;
        }
    };

    let project = table.get("project").and_then(|p| p.get("version"));
    let poetry = table
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|p| p.get("version"));

    [project, poetry]
        .into_iter()
        .flatten()
        .filter_map(toml::Value::as_str)
        .find_map(|raw| valid_or_skip(path, raw))
}

fn read(path: &Utf8Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            warn!(%path, error = %e, "skipping unreadable version source");
            None
        }
    }
}

fn valid_or_skip(path: &Utf8Path, raw: &str) -> Option<Version> {
    match parse_version(raw) {
        Ok(version) => Some(version),
        Err(_) => {
            debug!(%path, %raw, "ignoring non-semver version field");
            None
        }
    }
}
