//! Core library for nudge.
//!
//! This crate provides the version-resolution and file-mutation engine used
//! by the `nudge` CLI and any downstream consumers.
//!
//! # Modules
//!
//! - [`bump`] - Release planning and the two-phase compute/write applier
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`format`] - Target file classification
//! - [`git`] - Git collaborator (tag listing, commit, tag)
//! - [`hooks`] - External commands run after files are written
//! - [`mutate`] - Per-format content rewriting
//! - [`rules`] - Extra sed-style substitution rules
//! - [`version`] - Semver validity, increments, and base-version resolution
//!
//! # Quick Start
//!
//! ```no_run
//! use nudge_core::version::{self, Level};
//!
//! let next = version::increment_str("1.0.0", Level::Patch, Some("alpha"))
//!     .expect("valid version");
//! assert_eq!(next.to_string(), "1.0.1-alpha.0");
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod config;

pub mod error;

pub mod format;

pub mod git;

pub mod hooks;

pub mod mutate;

pub mod rules;

pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;

/// Check whether a binary is available on `PATH`.
pub fn has_binary(name: &str) -> bool {
    which::which(name).is_ok()
}
