//! Target file formats and classification.
//!
//! Every file nudge rewrites is classified once, by file name, into a
//! [`FileFormat`]. The mutation strategy is then an exhaustive match on that
//! enum; anything not recognized is treated as plain text.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// npm package manifest.
pub const PACKAGE_JSON: &str = "package.json";
/// npm lockfile.
pub const PACKAGE_LOCK_JSON: &str = "package-lock.json";
/// npm lockfile published with a package.
pub const NPM_SHRINKWRAP_JSON: &str = "npm-shrinkwrap.json";
/// Python project descriptor.
pub const PYPROJECT_TOML: &str = "pyproject.toml";
/// uv lockfile, paired with `pyproject.toml`.
pub const UV_LOCK: &str = "uv.lock";

/// A recognized file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileFormat {
    /// `package.json`: JSON object with a top-level `version`.
    PackageJson,
    /// `package-lock.json` / `npm-shrinkwrap.json`.
    PackageLock,
    /// `pyproject.toml`.
    PyProject,
    /// `uv.lock`, whose own-package entry is found via `pyproject.toml`.
    UvLock,
    /// Anything else: plain substring replacement.
    Text,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageJson => write!(f, "json-manifest"),
            Self::PackageLock => write!(f, "json-lockfile"),
            Self::PyProject => write!(f, "toml-project"),
            Self::UvLock => write!(f, "toml-lockfile"),
            Self::Text => write!(f, "generic-text"),
        }
    }
}

impl FileFormat {
    /// Files probed in the project root when no targets are given, in order.
    pub const DEFAULT_FILES: &[&str] = &[
        PACKAGE_JSON,
        PACKAGE_LOCK_JSON,
        NPM_SHRINKWRAP_JSON,
        PYPROJECT_TOML,
        UV_LOCK,
    ];
}

/// Classify `path` by its file name.
pub fn classify(path: &Utf8Path) -> FileFormat {
    match path.file_name() {
        Some(PACKAGE_JSON) => FileFormat::PackageJson,
        Some(PACKAGE_LOCK_JSON | NPM_SHRINKWRAP_JSON) => FileFormat::PackageLock,
        Some(PYPROJECT_TOML) => FileFormat::PyProject,
        Some(UV_LOCK) => FileFormat::UvLock,
        _ => FileFormat::Text,
    }
}

/// A file to rewrite, with its detected format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTarget {
    /// Path as given (relative paths are relative to the project root).
    pub path: Utf8PathBuf,
    /// Detected format.
    pub format: FileFormat,
}

impl FileTarget {
    /// Classify `path` into a target.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let format = classify(&path);
        Self { path, format }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_names() {
        assert_eq!(classify(Utf8Path::new("package.json")), FileFormat::PackageJson);
        assert_eq!(
            classify(Utf8Path::new("web/package-lock.json")),
            FileFormat::PackageLock
        );
        assert_eq!(
            classify(Utf8Path::new("npm-shrinkwrap.json")),
            FileFormat::PackageLock
        );
        assert_eq!(classify(Utf8Path::new("py/pyproject.toml")), FileFormat::PyProject);
        assert_eq!(classify(Utf8Path::new("uv.lock")), FileFormat::UvLock);
    }

    #[test]
    fn everything_else_is_text() {
        for name in ["README.md", "Cargo.toml", "poetry.lock", "src/version.py", "package.json5"] {
            assert_eq!(classify(Utf8Path::new(name)), FileFormat::Text, "{name}");
        }
    }

    #[test]
    fn format_display() {
        assert_eq!(FileFormat::PackageJson.to_string(), "json-manifest");
        assert_eq!(FileFormat::PackageLock.to_string(), "json-lockfile");
        assert_eq!(FileFormat::PyProject.to_string(), "toml-project");
        assert_eq!(FileFormat::Text.to_string(), "generic-text");
    }

    #[test]
    fn serde_roundtrip_format() {
        let json = serde_json::to_string(&FileFormat::PackageLock).unwrap();
        assert_eq!(json, "\"package-lock\"");
        let parsed: FileFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, FileFormat::PackageLock);
    }

    #[test]
    fn target_records_format() {
        let target = FileTarget::new("a/b/pyproject.toml");
        assert_eq!(target.format, FileFormat::PyProject);
        assert_eq!(target.path, "a/b/pyproject.toml");
    }
}
