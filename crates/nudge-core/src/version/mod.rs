//! Version determination and computation.
//!
//! This module owns the semver rules nudge applies: the validity predicate,
//! the increment levels, and (in [`resolve`]) the lookup of the base version
//! a bump starts from.

mod increment;
pub mod resolve;

pub use increment::{increment, increment_str};

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Failed to parse a semver string.
    #[error("invalid semver {input:?}: {source}")]
    InvalidSemver {
        /// The rejected input.
        input: String,
        /// Parser diagnostics.
        source: semver::Error,
    },

    /// A prerelease bump was requested without an identifier.
    #[error("prerelease bump requires a prerelease identifier (--preid)")]
    MissingPreid,

    /// The prerelease identifier does not form a valid semver prerelease.
    #[error("invalid prerelease identifier {0:?}")]
    InvalidPreid(String),

    /// The bumped component does not fit in a `u64`.
    #[error("cannot bump {version} at {level} level: component overflow")]
    Overflow {
        /// The version being bumped.
        version: String,
        /// The requested level.
        level: Level,
    },

    /// Gitless mode found nothing to bump from.
    #[error(
        "no base version found: pass --base, or add a version to package.json or pyproject.toml"
    )]
    NoVersionFound,
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Semver increment level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Patch release (x.y.Z).
    Patch,
    /// Minor release (x.Y.0).
    Minor,
    /// Major release (X.0.0).
    Major,
    /// Continue or start a prerelease track (x.y.z-preid.N).
    Prerelease,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
            Self::Prerelease => write!(f, "prerelease"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patch" => Ok(Self::Patch),
            "minor" => Ok(Self::Minor),
            "major" => Ok(Self::Major),
            "prerelease" => Ok(Self::Prerelease),
            other => Err(format!(
                "unknown level {other:?} (expected patch, minor, major, or prerelease)"
            )),
        }
    }
}

/// Parse a version string, stripping an optional `v` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let stripped = s.strip_prefix('v').unwrap_or(s);
    Version::parse(stripped).map_err(|source| VersionError::InvalidSemver {
        input: s.to_string(),
        source,
    })
}

/// Whether `s` is a valid semantic version, allowing one leading `v`.
///
/// Accepts the full grammar, including multi-segment prereleases and build
/// metadata. Numeric prerelease identifiers with leading zeros are rejected.
pub fn is_valid_semver(s: &str) -> bool {
    parse_version(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_v_prefix() {
        assert_eq!(parse_version("v1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_without_v_prefix() {
        assert_eq!(parse_version("1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn parse_invalid() {
        assert!(parse_version("not-a-version").is_err());
    }

    #[test]
    fn only_one_v_is_stripped() {
        assert!(!is_valid_semver("vv1.2.3"));
    }

    #[test]
    fn accepts_full_grammar() {
        for input in [
            "0.0.0",
            "1.2.3",
            "v1.2.3",
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-0.3.7",
            "1.0.0-x.7.z.92",
            "1.0.0-pre-1.0.0",
            "1.0.0+20130313144700",
            "1.0.0-beta+exp.sha.5114f85",
            "1.0.0-x-y-z.--",
        ] {
            assert!(is_valid_semver(input), "{input} should be valid");
        }
    }

    #[test]
    fn rejects_invalid_grammar() {
        for input in [
            "",
            "1",
            "1.2",
            "1.2.3.4",
            "01.2.3",
            "1.02.3",
            "1.0.0-01",
            "1.0.0-alpha.01",
            "1.0.0-",
            "1.0.0+",
            "1.0.0-alpha..1",
            "invalid",
        ] {
            assert!(!is_valid_semver(input), "{input} should be invalid");
        }
    }

    #[test]
    fn display_roundtrips_input() {
        for input in ["1.0.0-pre-1.0.0", "2.0.0-rc.1+build.7", "0.1.0"] {
            assert_eq!(parse_version(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn level_parses_tokens() {
        assert_eq!("patch".parse::<Level>().unwrap(), Level::Patch);
        assert_eq!("prerelease".parse::<Level>().unwrap(), Level::Prerelease);
        assert!("huge".parse::<Level>().is_err());
    }

    #[test]
    fn level_display() {
        assert_eq!(Level::Minor.to_string(), "minor");
        assert_eq!(Level::Prerelease.to_string(), "prerelease");
    }
}
