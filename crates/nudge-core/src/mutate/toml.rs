//! `pyproject.toml` and `uv.lock`.
//!
//! Both are edited line by line so that comments and layout survive. The
//! TOML parser is only used to reject malformed input and to read the
//! project name out of the descriptor.

use std::fs;

use camino::Utf8Path;
use regex::{Captures, Regex};
use tracing::debug;

use super::{MutateError, MutateResult};
use crate::format::PYPROJECT_TOML;

fn parse_table(path: &Utf8Path, content: &str) -> MutateResult<::toml::Table> {
    content
        .parse::<::toml::Table>()
        .map_err(|e| MutateError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Rewrite `version = "<base>"` lines (either quote style) of a `pyproject.toml`.
///
/// Only lines that start with `version` are considered, which leaves
/// dependency specifiers alone.
pub fn bump_pyproject(path: &Utf8Path, old: &str, base: &str, next: &str) -> MutateResult<String> {
    parse_table(path, old)?;

    let pattern = Regex::new(&format!(
        r#"(?m)^(?P<lead>version\s*=\s*)(?P<open>["']){}(?P<close>["'])"#,
        regex::escape(base)
    ))
    .map_err(|e| MutateError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let out = pattern.replace_all(old, |caps: &Captures<'_>| {
        if caps["open"] == caps["close"] {
            format!("{}{}{next}{}", &caps["lead"], &caps["open"], &caps["close"])
        } else {
            caps[0].to_string()
        }
    });
    Ok(out.into_owned())
}

/// Rewrite the own-package entry of a `uv.lock`.
///
/// The package name comes from the `pyproject.toml` next to the lockfile.
/// The `version` line directly after the matching `name` line inside a
/// `[[package]]` block is updated when it holds `base`.
pub fn bump_uv_lock(path: &Utf8Path, old: &str, base: &str, next: &str) -> MutateResult<String> {
    let descriptor = path
        .parent()
        .map_or_else(|| PYPROJECT_TOML.into(), |dir| dir.join(PYPROJECT_TOML));
    let descriptor_error = |reason: String| MutateError::Descriptor {
        path: descriptor.clone(),
        reason,
    };

    let raw = fs::read_to_string(&descriptor).map_err(|e| descriptor_error(e.to_string()))?;
    let table = raw
        .parse::<::toml::Table>()
        .map_err(|e| descriptor_error(e.to_string()))?;
    let name = project_name(&table)
        .ok_or_else(|| descriptor_error("no project.name or tool.poetry.name".into()))?;
    let wanted = normalize_name(name);
    debug!(%wanted, %descriptor, "locating locked package");

    parse_table(path, old)?;

    let mut out = String::with_capacity(old.len());
    let mut in_package = false;
    let mut after_name = false;
    let mut done = false;

    for line in old.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            in_package = trimmed == "[[package]]";
            after_name = false;
        } else if in_package && !done {
            if let Some(value) = string_value(trimmed, "name") {
                after_name = normalize_name(value) == wanted;
            } else if after_name {
                after_name = false;
                if string_value(trimmed, "version") == Some(base) {
                    out.push_str(&line.replacen(&format!("\"{base}\""), &format!("\"{next}\""), 1));
                    done = true;
                    continue;
                }
            }
        }
        out.push_str(line);
    }

    Ok(out)
}

/// `project.name`, then `tool.poetry.name`.
fn project_name(table: &::toml::Table) -> Option<&str> {
    table
        .get("project")
        .and_then(|project| project.get("name"))
        .and_then(::toml::Value::as_str)
        .or_else(|| {
            table
                .get("tool")
                .and_then(|tool| tool.get("poetry"))
                .and_then(|poetry| poetry.get("name"))
                .and_then(::toml::Value::as_str)
        })
}

/// PEP 503 normalization: lowercase, runs of `-`, `_`, `.` become `-`.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

/// The double-quoted value of a `key = "value"` line.
fn string_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?.trim_start().strip_prefix('=')?.trim();
    rest.strip_prefix('"')?.strip_suffix('"')
}
