//! Configuration loading and discovery.
//!
//! This module provides configuration file discovery by:
//! 1. Walking up from the current directory to find project config
//! 2. Loading user config from XDG config directory
//! 3. Merging with sensible defaults
//!
//! # Supported formats
//!
//! The following configuration file formats are supported:
//! - TOML (`.toml`)
//! - YAML (`.yaml`, `.yml`)
//! - JSON (`.json`)
//!
//! # Config file locations (in order of precedence, highest first):
//! - `.nudge.<ext>` in current directory or any parent
//! - `nudge.<ext>` in current directory or any parent
//! - `~/.config/nudge/config.<ext>` (user config)
//!
//! Where `<ext>` is one of: `toml`, `yaml`, `yml`, `json`
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use nudge_core::config::{Config, ConfigLoader};
//!
//! let cwd = std::env::current_dir().unwrap();
//! let cwd = Utf8PathBuf::try_from(cwd).expect("current directory is not valid UTF-8");
//! let config = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! assert_eq!(config.tag_prefix(), "v");
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::version::resolve::FallbackPolicy;

/// Tag prefix used when none is configured.
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// The configuration for nudge.
///
/// Deserialized from config files found during discovery (TOML, YAML, or JSON).
/// Every section is optional; command-line flags override what is set here.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application (e.g., "debug", "info", "warn", "error").
    pub log_level: LogLevel,
    /// Directory for JSONL log files (logs go to stderr if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Files to bump when none are given on the command line.
    ///
    /// Replaces the built-in list of well-known manifests and lockfiles.
    pub files: Option<Vec<Utf8PathBuf>>,
    /// Extra `s/pattern/replacement/flags` rules applied to every file.
    pub replace: Option<Vec<String>>,
    /// Base version resolution.
    pub version: Option<VersionConfig>,
    /// Commit and tag behavior.
    pub git: Option<GitConfig>,
    /// Commands run after the files are written.
    pub hooks: Option<HooksConfig>,
}

/// Base version resolution settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VersionConfig {
    /// What to do in gitless mode when no file carries a version.
    pub gitless_fallback: Option<FallbackPolicy>,
    /// Default prerelease identifier (e.g., `"rc"`).
    pub preid: Option<String>,
}

/// Commit and tag settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GitConfig {
    /// Never read tags, commit, or tag.
    pub gitless: Option<bool>,
    /// Prefix prepended to the version to form the tag name (default `"v"`).
    pub tag_prefix: Option<String>,
    /// Commit every tracked change, not only the bumped files.
    pub all: Option<bool>,
    /// Extra commit message paragraphs.
    ///
    /// Supports `{version}`, `{prev_version}` and `{tag}` interpolation.
    pub messages: Option<Vec<String>>,
}

/// Commands to run during a bump.
///
/// Commands support variable interpolation:
/// - `{version}`: the new version (e.g., `1.2.3`)
/// - `{prev_version}`: the base version
/// - `{tag}`: the git tag (e.g., `v1.2.3`)
///
/// # Example
///
/// ```toml
/// [hooks]
/// post_bump = ["npm install --package-lock-only", "git add -A"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct HooksConfig {
    /// Commands run after the files are written, before committing.
    pub post_bump: Option<Vec<String>>,
}

impl Config {
    /// Configured tag prefix, or [`DEFAULT_TAG_PREFIX`].
    pub fn tag_prefix(&self) -> &str {
        self.git
            .as_ref()
            .and_then(|git| git.tag_prefix.as_deref())
            .unwrap_or(DEFAULT_TAG_PREFIX)
    }

    /// Whether gitless mode is configured.
    pub fn gitless(&self) -> bool {
        self.git.as_ref().and_then(|git| git.gitless).unwrap_or(false)
    }

    /// Whether commits should include every tracked change.
    pub fn commit_all(&self) -> bool {
        self.git.as_ref().and_then(|git| git.all).unwrap_or(false)
    }

    /// Configured commit message paragraphs.
    pub fn messages(&self) -> &[String] {
        self.git
            .as_ref()
            .and_then(|git| git.messages.as_deref())
            .unwrap_or_default()
    }

    /// Gitless fallback policy.
    pub fn fallback(&self) -> FallbackPolicy {
        self.version
            .as_ref()
            .and_then(|version| version.gitless_fallback)
            .unwrap_or_default()
    }

    /// Default prerelease identifier.
    pub fn preid(&self) -> Option<&str> {
        self.version
            .as_ref()
            .and_then(|version| version.preid.as_deref())
    }

    /// Configured replace rules (unparsed).
    pub fn replace_rules(&self) -> &[String] {
        self.replace.as_deref().unwrap_or_default()
    }

    /// Commands to run after the files are written.
    pub fn post_bump(&self) -> &[String] {
        self.hooks
            .as_ref()
            .and_then(|hooks| hooks.post_bump.as_deref())
            .unwrap_or_default()
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information.
    Info,
    /// Warnings about potential issues (default).
    #[default]
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Supported configuration file extensions (in order of preference).
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for XDG directory lookup and config file names.
const APP_NAME: &str = "nudge";

/// Project config discovery stops at the directory containing this entry.
const BOUNDARY_MARKER: &str = ".git";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Starting directory for project config search.
    project_search_root: Option<Utf8PathBuf>,
    /// Whether to include user config from XDG directory.
    include_user_config: bool,
    /// Explicit config files to load (for testing or programmatic use).
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default settings.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            explicit_files: Vec::new(),
        }
    }

    /// Set the starting directory for project config search.
    ///
    /// The loader will walk up from this directory looking for config files.
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set whether to include user config from `~/.config/nudge/`.
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Add an explicit config file to load.
    ///
    /// Files are loaded in order, with later files taking precedence.
    /// Explicit files are loaded after discovered files.
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration, merging all discovered sources.
    ///
    /// Precedence (highest to lowest):
    /// 1. Explicit files (in order added via `with_file`)
    /// 2. Project config (closest to search root)
    /// 3. User config (`~/.config/nudge/config.<ext>`)
    /// 4. Default values
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<Config> {
        tracing::debug!("loading configuration");
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if self.include_user_config
            && let Some(user_config) = self.find_user_config()
        {
            figment = Self::merge_file(figment, &user_config);
        }

        if let Some(ref root) = self.project_search_root
            && let Some(project_config) = self.find_project_config(root)
        {
            figment = Self::merge_file(figment, &project_config);
        }

        for file in &self.explicit_files {
            figment = Self::merge_file(figment, file);
        }

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;
        tracing::debug!(
            log_level = config.log_level.as_str(),
            tag_prefix = config.tag_prefix(),
            gitless = config.gitless(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Find project config by walking up from the given directory.
    fn find_project_config(&self, start: &Utf8Path) -> Option<Utf8PathBuf> {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            for ext in CONFIG_EXTENSIONS {
                let dotfile = dir.join(format!(".{APP_NAME}.{ext}"));
                if dotfile.is_file() {
                    return Some(dotfile);
                }

                let regular = dir.join(format!("{APP_NAME}.{ext}"));
                if regular.is_file() {
                    return Some(regular);
                }
            }

            // The repository root is the last directory searched.
            if dir.join(BOUNDARY_MARKER).exists() {
                break;
            }

            current = dir.parent().map(Utf8Path::to_path_buf);
        }

        None
    }

    /// Find user config in XDG config directory.
    fn find_user_config(&self) -> Option<Utf8PathBuf> {
        let config_dir = user_config_dir()?;
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| config_dir.join(format!("config.{ext}")))
            .find(|path| path.is_file())
    }

    /// Merge a config file into the figment, detecting format from extension.
    fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
        match path.extension() {
            Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
            Some("json") => figment.merge(Json::file_exact(path.as_str())),
            _ => figment.merge(Toml::file_exact(path.as_str())),
        }
    }
}

/// Find the project config file path without loading it.
///
/// Stops at the same `.git` boundary [`ConfigLoader::load`] uses.
pub fn find_project_config<P: AsRef<Utf8Path>>(start: P) -> Option<Utf8PathBuf> {
    ConfigLoader::new().find_project_config(start.as_ref())
}

/// Get the user config directory path.
///
/// Returns `~/.config/nudge/` on Linux, `~/Library/Application Support/nudge/`
/// on macOS, and equivalent on other platforms.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("", "", APP_NAME)?;
    Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf()).ok()
}
