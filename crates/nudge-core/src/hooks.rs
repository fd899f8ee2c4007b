//! Post-bump commands.
//!
//! Commands are user-configured shell strings that run after every file has
//! been written and before anything is committed. They run one at a time,
//! in order, with stdio inherited so their output reaches the terminal. The
//! first failure stops the run.
//!
//! # Variables
//!
//! Commands support `{var}` interpolation for `{version}`,
//! `{prev_version}` and `{tag}`.

use std::process::Command;
use std::time::Instant;

use camino::Utf8Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors from running commands.
#[derive(Error, Debug)]
pub enum HookError {
    /// A command exited with a non-zero status.
    #[error("command failed ({status}): {command}")]
    CommandFailed {
        /// The command that failed, after interpolation.
        command: String,
        /// The exit code, if available.
        exit_code: Option<i32>,
        /// Human-readable exit status.
        status: String,
    },

    /// Failed to spawn the shell.
    #[error("failed to execute command {command:?}: {source}")]
    Exec {
        /// The command that could not be started.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for command execution.
pub type HookResult<T> = Result<T, HookError>;

/// Variables available for interpolation in commands.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The new version (e.g., `1.2.3`).
    pub version: String,
    /// The base version it replaces (e.g., `1.1.0`).
    pub prev_version: String,
    /// The tag name (e.g., `v1.2.3`).
    pub tag: String,
}

/// Run `commands` sequentially from `project_root`.
///
/// Returns the commands as executed, after interpolation.
#[instrument(skip_all, fields(count = commands.len(), %project_root))]
pub fn run_commands(
    commands: &[String],
    context: &HookContext,
    project_root: &Utf8Path,
) -> HookResult<Vec<String>> {
    let mut results = Vec::with_capacity(commands.len());
    for command in commands {
        results.push(run_single(command, context, project_root)?);
    }
    Ok(results)
}

fn run_single(
    command: &str,
    context: &HookContext,
    project_root: &Utf8Path,
) -> HookResult<String> {
    let interpolated = interpolate(command, context);
    info!(command = %interpolated, "running command");

    let start = Instant::now();
    let status = shell(&interpolated)
        .current_dir(project_root.as_std_path())
        .status()
        .map_err(|source| HookError::Exec {
            command: interpolated.clone(),
            source,
        })?;
    let duration = start.elapsed();
    debug!(?duration, %status, "command finished");

    if !status.success() {
        return Err(HookError::CommandFailed {
            command: interpolated,
            exit_code: status.code(),
            status: status.to_string(),
        });
    }

    Ok(interpolated)
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Replace `{var}` placeholders with values from the context.
pub fn interpolate(command: &str, context: &HookContext) -> String {
    command
        .replace("{version}", &context.version)
        .replace("{prev_version}", &context.prev_version)
        .replace("{tag}", &context.tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_context() -> HookContext {
        HookContext {
            version: "1.2.3".into(),
            prev_version: "1.1.0".into(),
            tag: "v1.2.3".into(),
        }
    }

    #[test]
    fn interpolate_all_variables() {
        let result = interpolate("echo {version} {prev_version} {tag}", &test_context());
        assert_eq!(result, "echo 1.2.3 1.1.0 v1.2.3");
    }

    #[test]
    fn interpolate_preserves_unknown_braces() {
        let result = interpolate("echo {unknown} {version}", &test_context());
        assert_eq!(result, "echo {unknown} 1.2.3");
    }

    #[test]
    fn run_commands_empty_list() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8Path::from_path(tmp.path()).unwrap();
        let results = run_commands(&[], &test_context(), root).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn run_commands_in_project_root_with_variables() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8Path::from_path(tmp.path()).unwrap();
        let commands = vec!["echo {tag}> out.txt".to_string()];
        let results = run_commands(&commands, &test_context(), root).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], "echo v1.2.3> out.txt");
        let written = fs::read_to_string(tmp.path().join("out.txt")).unwrap();
        assert_eq!(written.trim(), "v1.2.3");
    }

    #[test]
    fn run_commands_sequentially() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8Path::from_path(tmp.path()).unwrap();
        let commands = vec![
            "echo first> order.txt".to_string(),
            "echo second>> order.txt".to_string(),
        ];
        run_commands(&commands, &test_context(), root).unwrap();
        let written = fs::read_to_string(tmp.path().join("order.txt")).unwrap();
        let lines: Vec<&str> = written.lines().map(str::trim).collect();
        assert_eq!(lines, ["first", "second"]);
    }

    #[test]
    fn failure_stops_execution() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8Path::from_path(tmp.path()).unwrap();
        let commands = vec!["exit 3".to_string(), "echo after> after.txt".to_string()];
        let err = run_commands(&commands, &test_context(), root).unwrap_err();
        assert!(matches!(
            err,
            HookError::CommandFailed {
                exit_code: Some(3),
                ..
            }
        ));
        assert!(!tmp.path().join("after.txt").exists());
    }
}
