//! npm manifests and lockfiles.
//!
//! `package.json` is edited textually so that key order, indentation and
//! any hand formatting survive; the result is re-parsed to prove the edit
//! hit the top-level `version` and nothing else. Lockfiles are machine
//! written, so they are parsed, updated and re-serialized.

use camino::Utf8Path;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::{MutateError, MutateResult};

fn parse_error(path: &Utf8Path, message: impl ToString) -> MutateError {
    MutateError::Parse {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn top_level_version(doc: &Value) -> Option<&str> {
    doc.get("version").and_then(Value::as_str)
}

/// Rewrite the top-level `"version": "<base>"` of a `package.json`.
///
/// Returns `old` unchanged when the top-level version is not `base`.
pub fn bump_manifest(path: &Utf8Path, old: &str, base: &str, next: &str) -> MutateResult<String> {
    let doc: Value = serde_json::from_str(old).map_err(|e| parse_error(path, e))?;
    if !doc.is_object() {
        return Err(parse_error(path, "expected a JSON object"));
    }

    match top_level_version(&doc) {
        Some(current) if current == base => {}
        other => {
            debug!(?other, %base, "top-level version does not match base");
            return Ok(old.to_string());
        }
    }

    let pattern = Regex::new(&format!(
        r#""version"\s*:\s*"({})""#,
        regex::escape(base)
    ))
    .map_err(|e| parse_error(path, e))?;

    // Nested objects may carry an identical "version" pair earlier in the
    // file; take the first candidate whose rewrite moves the top-level value.
    for caps in pattern.captures_iter(old) {
        let Some(value) = caps.get(1) else {
            continue;
        };
        let candidate = format!("{}{}{}", &old[..value.start()], next, &old[value.end()..]);
        let reparsed: Value = serde_json::from_str(&candidate).map_err(|e| parse_error(path, e))?;
        if top_level_version(&reparsed) == Some(next) {
            return Ok(candidate);
        }
    }

    Err(parse_error(path, "could not locate the top-level \"version\" field"))
}

/// Set the root version fields of a `package-lock.json` / `npm-shrinkwrap.json`.
///
/// Handles both the flat `version` of lockfile v1 and `packages[""].version`
/// of v2/v3. Returns `old` unchanged when neither field needed an update.
///
/// The lockfile is derived from the manifest, so its root version is set to
/// `next` whatever it currently holds. The base check happens on the
/// manifest.
pub fn bump_lockfile(path: &Utf8Path, old: &str, next: &str) -> MutateResult<String> {
    let mut doc: Value = serde_json::from_str(old).map_err(|e| parse_error(path, e))?;
    let Some(root) = doc.as_object_mut() else {
        return Err(parse_error(path, "expected a JSON object"));
    };

    let mut changed = false;
    if let Some(version) = root.get_mut("version") {
        changed |= set_version(version, next);
    }
    if let Some(version) = root
        .get_mut("packages")
        .and_then(|packages| packages.get_mut(""))
        .and_then(|package| package.get_mut("version"))
    {
        changed |= set_version(version, next);
    }

    if !changed {
        return Ok(old.to_string());
    }

    let mut out = serde_json::to_string_pretty(&doc).map_err(|e| parse_error(path, e))?;
    out.push('\n');
    Ok(out)
}

fn set_version(slot: &mut Value, next: &str) -> bool {
    if slot.as_str() == Some(next) {
        return false;
    }
    *slot = Value::String(next.to_string());
    true
}
