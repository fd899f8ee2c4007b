//! Git operations for release workflows.
//!
//! Shells out to `git` for all operations. This ensures we inherit the user's
//! SSH keys, GPG signing, hooks, and other configuration.
//!
//! The resolver and the applier only see the [`TagSource`] and [`Vcs`]
//! traits, so tests can substitute an in-memory repository.

use std::process::Command;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "commit").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Lists tags so the resolver can find the latest released version.
pub trait TagSource {
    /// All tag names, most recently created first.
    fn tags_newest_first(&self) -> GitResult<Vec<String>>;
}

/// Records a release: commit the bumped files, then tag the commit.
pub trait Vcs: TagSource {
    /// Commit `files` (or every tracked change when `all` is set).
    ///
    /// Each entry of `messages` becomes one paragraph of the commit message.
    fn commit(&self, files: &[Utf8PathBuf], messages: &[String], all: bool) -> GitResult<()>;

    /// Create (or move) an annotated tag on `HEAD`.
    fn tag(&self, name: &str, message: &str) -> GitResult<()>;
}

/// The system `git`, run inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct Git {
    root: Utf8PathBuf,
}

impl Git {
    /// Run git commands from `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Check if `root` is inside a git work tree.
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn is_inside_repo(&self) -> GitResult<bool> {
        match self.run(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) => Ok(output.trim() == "true"),
            Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check whether the working tree is clean (no uncommitted changes).
    #[instrument(skip(self), fields(root = %self.root))]
    pub fn is_clean(&self) -> GitResult<bool> {
        let output = self.run(&["status", "--porcelain"])?;
        let clean = output.trim().is_empty();
        debug!(clean, "working tree status");
        Ok(clean)
    }

    /// Run a git command and return its stdout.
    fn run(&self, args: &[&str]) -> GitResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.root.as_std_path())
            .output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

            // Detect "not a git repo" specifically
            if stderr.contains("not a git repository") {
                return Err(GitError::NotARepo);
            }

            Err(GitError::Command {
                command: args.first().unwrap_or(&"").to_string(),
                stderr,
            })
        }
    }
}

impl TagSource for Git {
    #[instrument(skip(self), fields(root = %self.root))]
    fn tags_newest_first(&self) -> GitResult<Vec<String>> {
        let output = self.run(&["tag", "--list", "--sort=-creatordate"])?;
        let tags: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(count = tags.len(), "listed tags");
        Ok(tags)
    }
}

impl Vcs for Git {
    #[instrument(skip(self, messages), fields(root = %self.root, files = files.len()))]
    fn commit(&self, files: &[Utf8PathBuf], messages: &[String], all: bool) -> GitResult<()> {
        let mut args: Vec<&str> = vec!["commit"];
        for message in messages {
            args.extend(["-m", message.as_str()]);
        }

        // Paths must be known to git before `commit -- <paths>` accepts them.
        if !files.is_empty() {
            let mut add: Vec<&str> = vec!["add", "--"];
            add.extend(files.iter().map(|f| f.as_str()));
            self.run(&add)?;
        }

        if all {
            args.push("-a");
        } else {
            args.push("--");
            args.extend(files.iter().map(|f| f.as_str()));
        }

        self.run(&args)?;
        debug!(all, "created release commit");
        Ok(())
    }

    #[instrument(skip(self, message), fields(root = %self.root))]
    fn tag(&self, name: &str, message: &str) -> GitResult<()> {
        self.run(&["tag", "-a", "-f", "-m", message, name])?;
        debug!(%name, "created tag");
        Ok(())
    }
}
