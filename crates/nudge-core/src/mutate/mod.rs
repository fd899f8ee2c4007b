//! Per-format content rewriting.
//!
//! [`compute_new_content`] is a pure function of the old content plus the
//! [`MutationContext`] (it only touches the filesystem to read the
//! `pyproject.toml` that sits next to a `uv.lock`). Nothing here writes.
//!
//! Pipeline for every target:
//!
//! 1. format-specific version substitution (see [`FileFormat`]),
//! 2. date stamping, when a date is supplied,
//! 3. the extra [`SubstitutionRule`]s, in order.
//!
//! A file whose final content is byte-identical to the old content is an
//! error: it almost always means the base version does not match what is in
//! the file.

mod json;
mod text;
mod toml;

use camino::Utf8PathBuf;
use semver::Version;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::format::{FileFormat, FileTarget};
use crate::rules::SubstitutionRule;

pub use text::stamp_date;

/// Errors from computing new file content.
#[derive(Error, Debug)]
pub enum MutateError {
    /// A JSON or TOML file could not be parsed, or its version field could
    /// not be located.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Offending file.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },

    /// The project descriptor paired with a lockfile is unusable.
    #[error("cannot use {path} to locate the locked package: {reason}")]
    Descriptor {
        /// Path to the descriptor.
        path: Utf8PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The version substitution produced no change.
    #[error("no change produced in {path} (does it contain the base version?)")]
    NoChange {
        /// File that would have been left untouched.
        path: Utf8PathBuf,
    },
}

/// Result alias for mutation.
pub type MutateResult<T> = Result<T, MutateError>;

/// Everything a mutation needs besides the file itself.
#[derive(Debug, Clone, Copy)]
pub struct MutationContext<'a> {
    /// Version currently in the files.
    pub base: &'a Version,
    /// Version to write.
    pub next: &'a Version,
    /// Replacement for every `YYYY-MM-DD` stamp, if any.
    pub date: Option<&'a str>,
    /// Extra substitutions applied last.
    pub rules: &'a [SubstitutionRule],
}

/// Compute the rewritten content of `target`.
#[instrument(skip(old, ctx), fields(path = %target.path, format = %target.format, base = %ctx.base, next = %ctx.next))]
pub fn compute_new_content(
    target: &FileTarget,
    old: &str,
    ctx: &MutationContext<'_>,
) -> MutateResult<String> {
    let no_change = || MutateError::NoChange {
        path: target.path.clone(),
    };

    if ctx.base == ctx.next {
        return Err(no_change());
    }

    let base = ctx.base.to_string();
    let next = ctx.next.to_string();
    let path = target.path.as_path();

    let mut content = match target.format {
        FileFormat::PackageJson => json::bump_manifest(path, old, &base, &next)?,
        FileFormat::PackageLock => json::bump_lockfile(path, old, &next)?,
        FileFormat::PyProject => toml::bump_pyproject(path, old, &base, &next)?,
        FileFormat::UvLock => toml::bump_uv_lock(path, old, &base, &next)?,
        FileFormat::Text => text::replace_version(old, &base, &next),
    };

    if let Some(date) = ctx.date {
        content = stamp_date(&content, date);
    }

    for rule in ctx.rules {
        content = rule.apply(&content, ctx.next);
    }

    if content == old {
        return Err(no_change());
    }

    debug!(bytes = content.len(), "computed new content");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn mutate(path: &str, old: &str, base: &str, next: &str) -> MutateResult<String> {
        let (base, next) = (v(base), v(next));
        let ctx = MutationContext {
            base: &base,
            next: &next,
            date: None,
            rules: &[],
        };
        compute_new_content(&FileTarget::new(path), old, &ctx)
    }

    #[test]
    fn text_file_with_date_stamp() {
        let (base, next) = (v("1.0.0"), v("1.0.1"));
        let ctx = MutationContext {
            base: &base,
            next: &next,
            date: Some("2026-10-18"),
            rules: &[],
        };
        let out = compute_new_content(
            &FileTarget::new("testfile.txt"),
            "testfile v1.0.0 (1999-01-01)\n",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "testfile v1.0.1 (2026-10-18)\n");
    }

    #[test]
    fn rules_run_after_substitution() {
        let (base, next) = (v("1.2.3"), v("2.0.0"));
        let rules = vec![SubstitutionRule::parse(r"s/docs\/v\d+/docs\/v${major}/g").unwrap()];
        let ctx = MutationContext {
            base: &base,
            next: &next,
            date: None,
            rules: &rules,
        };
        let out = compute_new_content(
            &FileTarget::new("README.md"),
            "version 1.2.3, see docs/v1\n",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "version 2.0.0, see docs/v2\n");
    }

    #[test]
    fn same_base_and_next_is_no_change() {
        for path in ["README.md", "package.json", "package-lock.json", "pyproject.toml"] {
            let err = mutate(path, "{\"version\": \"1.0.0\"}", "1.0.0", "1.0.0").unwrap_err();
            assert!(matches!(err, MutateError::NoChange { .. }), "{path}");
        }
    }

    #[test]
    fn missing_base_is_no_change() {
        let err = mutate("CHANGELOG.md", "nothing here\n", "1.0.0", "1.0.1").unwrap_err();
        assert!(matches!(err, MutateError::NoChange { ref path } if path == "CHANGELOG.md"));
    }

    #[test]
    fn date_stamp_alone_is_a_change() {
        let (base, next) = (v("1.0.0"), v("1.0.1"));
        let ctx = MutationContext {
            base: &base,
            next: &next,
            date: Some("2026-10-18"),
            rules: &[],
        };
        let out =
            compute_new_content(&FileTarget::new("NOTES"), "released 1999-01-01\n", &ctx).unwrap();
        assert_eq!(out, "released 2026-10-18\n");
    }

    #[test]
    fn rule_alone_is_a_change() {
        let (base, next) = (v("1.2.3"), v("2.0.0"));
        let rules = vec![SubstitutionRule::parse(r"s/docs\/v\d+/docs\/v${major}/g").unwrap()];
        let ctx = MutationContext {
            base: &base,
            next: &next,
            date: None,
            rules: &rules,
        };
        let out = compute_new_content(&FileTarget::new("README.md"), "see docs/v1\n", &ctx).unwrap();
        assert_eq!(out, "see docs/v2\n");
    }

    #[test]
    fn date_stamp_already_current_is_no_change() {
        let (base, next) = (v("1.0.0"), v("1.0.1"));
        let ctx = MutationContext {
            base: &base,
            next: &next,
            date: Some("2026-10-18"),
            rules: &[],
        };
        let err = compute_new_content(&FileTarget::new("NOTES"), "released 2026-10-18\n", &ctx)
            .unwrap_err();
        assert!(matches!(err, MutateError::NoChange { .. }));
    }

    #[test]
    fn dispatches_structured_formats() {
        let out = mutate("package.json", "{\"version\": \"1.0.0\"}\n", "1.0.0", "1.1.0").unwrap();
        assert_eq!(out, "{\"version\": \"1.1.0\"}\n");

        let out = mutate(
            "pyproject.toml",
            "[project]\nversion = \"1.0.0\"\n",
            "1.0.0",
            "1.1.0",
        )
        .unwrap();
        assert_eq!(out, "[project]\nversion = \"1.1.0\"\n");
    }
}
