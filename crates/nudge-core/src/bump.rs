//! Version bump planning and execution.
//!
//! All orchestration logic lives here. The CLI is purely a display layer.
//!
//! # Workflow
//!
//! 1. **Plan** ([`plan_bump`]): resolve the base version, compute the next
//!    one, parse the extra rules and validate every target file.
//! 2. **Compute** ([`ReleaseTransition::compute`]): read every target and
//!    compute its new content. Any failure here leaves the disk untouched.
//! 3. **Execute** ([`ReleaseTransition::execute`]): write every file, run
//!    the configured commands, then commit and tag.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::format::{FileFormat, FileTarget};
use crate::git::{GitError, TagSource, Vcs};
use crate::hooks::{self, HookContext, HookError};
use crate::mutate::{self, MutateError, MutationContext};
use crate::rules::{RuleError, SubstitutionRule};
use crate::version::resolve::{ResolveRequest, VersionSource, resolve_base_version};
use crate::version::{Level, VersionError, increment};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors from bump operations.
#[derive(Error, Debug)]
pub enum BumpError {
    /// A target file does not exist.
    #[error("no such file: {path}")]
    MissingFile {
        /// The missing path.
        path: Utf8PathBuf,
    },

    /// A target exists but is not a regular file.
    #[error("not a regular file: {path}")]
    NotAFile {
        /// The offending path.
        path: Utf8PathBuf,
    },

    /// Gitless mode with nothing to write.
    #[error("no files to bump (pass file arguments or configure `files`)")]
    NoTargets,

    /// A target could not be inspected or read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A target could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// The file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Base version resolution or increment failed.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A replace rule is malformed.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// New content could not be computed.
    #[error(transparent)]
    Mutate(#[from] MutateError),

    /// A post-bump command failed.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Committing or tagging failed.
    #[error(transparent)]
    Git(#[from] GitError),
}

/// Result alias for bump operations.
pub type BumpResult<T> = Result<T, BumpError>;

// ──────────────────────────────────────────────
// Plan
// ──────────────────────────────────────────────

/// What the caller asked for. Unset fields fall back to [`Config`].
#[derive(Debug, Clone)]
pub struct BumpRequest {
    /// Increment level.
    pub level: Level,
    /// Explicit base version (skips resolution).
    pub base: Option<String>,
    /// Prerelease identifier.
    pub preid: Option<String>,
    /// Target files; empty means configured or default files.
    pub files: Vec<Utf8PathBuf>,
    /// Replacement for `YYYY-MM-DD` stamps.
    pub date: Option<String>,
    /// Extra replace rules, applied after the configured ones.
    pub replace: Vec<String>,
    /// Force gitless mode.
    pub gitless: bool,
    /// Tag prefix override.
    pub tag_prefix: Option<String>,
}

impl BumpRequest {
    /// A request for `level` with everything else left to config.
    pub const fn new(level: Level) -> Self {
        Self {
            level,
            base: None,
            preid: None,
            files: Vec::new(),
            date: None,
            replace: Vec::new(),
            gitless: false,
            tag_prefix: None,
        }
    }
}

/// A fully validated bump, ready to compute and execute.
#[derive(Debug, Clone)]
pub struct ReleaseTransition {
    /// The version being replaced.
    pub base: Version,
    /// Where the base version came from.
    pub base_source: VersionSource,
    /// The new version.
    pub next: Version,
    /// Tag name for the new version (`{prefix}{next}`).
    pub tag: String,
    /// Files to rewrite, deduplicated, in the order given.
    pub targets: Vec<FileTarget>,
    /// Replacement for date stamps.
    pub date: Option<String>,
    /// Extra substitutions.
    pub rules: Vec<SubstitutionRule>,
    /// Skip commit and tag.
    pub gitless: bool,
    project_root: Utf8PathBuf,
}

/// Plan a bump: resolve the base version, compute the next one, validate
/// the targets.
///
/// Nothing is read for mutation and nothing is written.
#[instrument(skip(config, request, tags), fields(%project_root, level = %request.level))]
pub fn plan_bump(
    project_root: &Utf8Path,
    config: &Config,
    request: &BumpRequest,
    tags: &dyn TagSource,
) -> BumpResult<ReleaseTransition> {
    let gitless = request.gitless || config.gitless();
    let tag_prefix = request
        .tag_prefix
        .as_deref()
        .unwrap_or_else(|| config.tag_prefix());

    let resolved = resolve_base_version(
        &ResolveRequest {
            explicit_base: request.base.as_deref(),
            gitless,
            project_root,
            tag_prefix,
            fallback: config.fallback(),
        },
        tags,
    )?;

    // The configured preid only applies to prerelease bumps.
    let preid = request.preid.as_deref().or_else(|| {
        if request.level == Level::Prerelease {
            config.preid()
        } else {
            None
        }
    });
    let next = increment(&resolved.version, request.level, preid)?;

    let rules = config
        .replace_rules()
        .iter()
        .chain(&request.replace)
        .map(|expr| SubstitutionRule::parse(expr))
        .collect::<Result<Vec<_>, _>>()?;

    let targets = resolve_targets(project_root, config, &request.files)?;
    if targets.is_empty() && gitless {
        return Err(BumpError::NoTargets);
    }

    let tag = format!("{tag_prefix}{next}");
    info!(
        base = %resolved.version,
        source = %resolved.source,
        %next,
        %tag,
        files = targets.len(),
        "planned bump"
    );

    Ok(ReleaseTransition {
        base: resolved.version,
        base_source: resolved.source,
        next,
        tag,
        targets,
        date: request.date.clone(),
        rules,
        gitless,
        project_root: project_root.to_path_buf(),
    })
}

/// Well-known manifests and lockfiles present in `project_root`.
pub fn default_targets(project_root: &Utf8Path) -> Vec<FileTarget> {
    FileFormat::DEFAULT_FILES
        .iter()
        .map(|name| project_root.join(name))
        .filter(|path| path.is_file())
        .map(FileTarget::new)
        .collect()
}

/// Pick, validate and deduplicate the files to rewrite.
fn resolve_targets(
    project_root: &Utf8Path,
    config: &Config,
    files: &[Utf8PathBuf],
) -> BumpResult<Vec<FileTarget>> {
    let requested: &[Utf8PathBuf] = if files.is_empty() {
        config.files.as_deref().unwrap_or_default()
    } else {
        files
    };

    if requested.is_empty() {
        let defaults = default_targets(project_root);
        debug!(count = defaults.len(), "using default targets");
        return Ok(defaults);
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(requested.len());
    for file in requested {
        let path = project_root.join(file);
        // Follows symlinks, so a link to a regular file is accepted.
        let metadata = fs::metadata(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                BumpError::MissingFile { path: path.clone() }
            } else {
                BumpError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        if !metadata.is_file() {
            return Err(BumpError::NotAFile { path });
        }

        let canonical = path
            .canonicalize_utf8()
            .map_err(|source| BumpError::Read {
                path: path.clone(),
                source,
            })?;
        if !seen.insert(canonical) {
            debug!(%path, "skipping duplicate target");
            continue;
        }
        targets.push(FileTarget::new(path));
    }
    Ok(targets)
}

// ──────────────────────────────────────────────
// Compute / execute
// ──────────────────────────────────────────────

/// The computed rewrite of one file.
#[derive(Debug, Clone)]
pub struct FileChange {
    /// The file.
    pub target: FileTarget,
    /// Content before the bump.
    pub old_content: String,
    /// Content after the bump.
    pub new_content: String,
}

/// Knobs for [`ReleaseTransition::execute`].
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Compute everything but write, run and commit nothing.
    pub dry_run: bool,
    /// Commands run after the files are written.
    pub commands: Vec<String>,
    /// Extra commit message paragraphs.
    pub messages: Vec<String>,
    /// Commit every tracked change.
    pub all: bool,
}

/// Result of a bump.
#[derive(Debug, Clone, Serialize)]
pub struct BumpOutcome {
    /// The base version.
    pub previous: Version,
    /// Where the base version came from.
    pub source: VersionSource,
    /// The new version.
    pub new: Version,
    /// Tag name, unless gitless.
    pub tag: Option<String>,
    /// Files rewritten (or that would be, in a dry run).
    pub files: Vec<FileTarget>,
    /// Commands that ran.
    pub commands: Vec<String>,
    /// Whether a commit was created.
    pub committed: bool,
    /// Whether a tag was created.
    pub tagged: bool,
    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl ReleaseTransition {
    /// Variables for command and message interpolation.
    pub fn hook_context(&self) -> HookContext {
        HookContext {
            version: self.next.to_string(),
            prev_version: self.base.to_string(),
            tag: self.tag.clone(),
        }
    }

    /// Read every target and compute its new content.
    #[instrument(skip(self), fields(next = %self.next, files = self.targets.len()))]
    pub fn compute(&self) -> BumpResult<Vec<FileChange>> {
        let ctx = MutationContext {
            base: &self.base,
            next: &self.next,
            date: self.date.as_deref(),
            rules: &self.rules,
        };

        self.targets
            .iter()
            .map(|target| {
                let old_content =
                    fs::read_to_string(&target.path).map_err(|source| BumpError::Read {
                        path: target.path.clone(),
                        source,
                    })?;
                let new_content = mutate::compute_new_content(target, &old_content, &ctx)?;
                Ok(FileChange {
                    target: target.clone(),
                    old_content,
                    new_content,
                })
            })
            .collect()
    }

    /// Compute every change, then write, run commands, commit and tag.
    #[instrument(skip(self, options, vcs), fields(next = %self.next, dry_run = options.dry_run))]
    pub fn execute(&self, options: &ExecuteOptions, vcs: &dyn Vcs) -> BumpResult<BumpOutcome> {
        let changes = self.compute()?;
        let context = self.hook_context();

        let mut outcome = BumpOutcome {
            previous: self.base.clone(),
            source: self.base_source.clone(),
            new: self.next.clone(),
            tag: (!self.gitless).then(|| self.tag.clone()),
            files: changes.iter().map(|change| change.target.clone()).collect(),
            commands: Vec::new(),
            committed: false,
            tagged: false,
            dry_run: options.dry_run,
        };

        if options.dry_run {
            debug!("dry run, nothing written");
            return Ok(outcome);
        }

        for change in &changes {
            write_in_place(&change.target.path, &change.new_content)?;
            debug!(path = %change.target.path, "wrote file");
        }

        outcome.commands = hooks::run_commands(&options.commands, &context, &self.project_root)?;

        if self.gitless {
            return Ok(outcome);
        }

        let files: Vec<Utf8PathBuf> = changes
            .iter()
            .map(|change| self.relative(&change.target.path))
            .collect();
        if files.is_empty() && !options.all {
            debug!("no files changed, tagging without a commit");
        } else {
            let mut messages = vec![self.tag.clone()];
            messages.extend(
                options
                    .messages
                    .iter()
                    .map(|message| hooks::interpolate(message, &context)),
            );
            vcs.commit(&files, &messages, options.all)?;
            outcome.committed = true;
        }

        vcs.tag(&self.tag, &self.tag)?;
        outcome.tagged = true;
        info!(tag = %self.tag, committed = outcome.committed, "release recorded");

        Ok(outcome)
    }

    fn relative(&self, path: &Utf8Path) -> Utf8PathBuf {
        path.strip_prefix(&self.project_root)
            .map_or_else(|_| path.to_path_buf(), Utf8Path::to_path_buf)
    }
}

/// Truncate and rewrite `path` in place, keeping its permissions and any
/// symlink pointing at it. Falls back to replacing the file.
fn write_in_place(path: &Utf8Path, content: &str) -> BumpResult<()> {
    let in_place = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .and_then(|mut file| file.write_all(content.as_bytes()));

    if let Err(e) = in_place {
        debug!(%path, error = %e, "in-place rewrite failed, replacing file");
        fs::write(path, content).map_err(|source| BumpError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
