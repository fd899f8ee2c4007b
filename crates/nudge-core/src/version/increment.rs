//! Increment computation.
//!
//! Numeric bumps treat an existing prerelease/build suffix as opaque text and
//! carry it onto the new triple: `1.0.0-pre-1.0.0` bumped at patch level is
//! `1.0.1-pre-1.0.0`. Only a suffix of the exact form `{preid}.{n}` is
//! treated as a numbered prerelease track.

use semver::{Prerelease, Version};
use tracing::{debug, instrument};

use super::{Level, VersionError, VersionResult, parse_version};

/// Validate `base` and compute the next version.
pub fn increment_str(base: &str, level: Level, preid: Option<&str>) -> VersionResult<Version> {
    let current = parse_version(base)?;
    increment(&current, level, preid)
}

/// Compute the next version for `level`.
///
/// - `patch`/`minor`/`major`: bump the component and zero the lower ones.
///   Without `preid` the old suffix is carried over verbatim; with `preid`
///   the suffix becomes `-{preid}.0`.
/// - `prerelease`: requires `preid`. A release version gets a patch bump and
///   `-{preid}.0`; a matching `{preid}.{n}` track becomes `{preid}.{n+1}`;
///   any other prerelease is replaced by `-{preid}.0` without a numeric bump.
#[instrument(skip(current), fields(%current))]
pub fn increment(current: &Version, level: Level, preid: Option<&str>) -> VersionResult<Version> {
    let preid = preid.filter(|id| !id.is_empty());

    let next = match level {
        Level::Prerelease => {
            let id = preid.ok_or(VersionError::MissingPreid)?;
            next_prerelease(current, id)?
        }
        Level::Patch | Level::Minor | Level::Major => {
            let mut next = bump_triple(current, level)?;
            if let Some(id) = preid {
                next.pre = fresh_track(id)?;
            } else {
                next.pre = current.pre.clone();
                next.build = current.build.clone();
            }
            next
        }
    };

    debug!(%next, %level, ?preid, "computed next version");
    Ok(next)
}

/// The numeric triple bumped at `level`, without any suffix.
fn bump_triple(current: &Version, level: Level) -> VersionResult<Version> {
    let overflow = || VersionError::Overflow {
        version: current.to_string(),
        level,
    };
    let next = match level {
        Level::Major => Version::new(current.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
        Level::Minor => Version::new(
            current.major,
            current.minor.checked_add(1).ok_or_else(overflow)?,
            0,
        ),
        Level::Patch | Level::Prerelease => Version::new(
            current.major,
            current.minor,
            current.patch.checked_add(1).ok_or_else(overflow)?,
        ),
    };
    Ok(next)
}

fn next_prerelease(current: &Version, id: &str) -> VersionResult<Version> {
    if current.pre.is_empty() {
        let mut next = bump_triple(current, Level::Patch)?;
        next.pre = fresh_track(id)?;
        return Ok(next);
    }

    let mut next = Version::new(current.major, current.minor, current.patch);
    next.pre = match track_counter(current.pre.as_str(), id) {
        Some(n) => {
            let n = n.checked_add(1).ok_or_else(|| VersionError::Overflow {
                version: current.to_string(),
                level: Level::Prerelease,
            })?;
            prerelease(&format!("{id}.{n}"), id)?
        }
        None => fresh_track(id)?,
    };
    Ok(next)
}

fn fresh_track(id: &str) -> VersionResult<Prerelease> {
    prerelease(&format!("{id}.0"), id)
}

fn prerelease(text: &str, id: &str) -> VersionResult<Prerelease> {
    Prerelease::new(text).map_err(|_| VersionError::InvalidPreid(id.to_string()))
}

/// The counter of a `{id}.{n}` prerelease, if `pre` is exactly that shape.
fn track_counter(pre: &str, id: &str) -> Option<u64> {
    let counter = pre.strip_prefix(id)?.strip_prefix('.')?;
    if counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    counter.parse().ok()
}
