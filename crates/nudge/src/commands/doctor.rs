//! Doctor command: diagnose configuration and environment.

use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use nudge_core::bump;
use nudge_core::config;
use nudge_core::git::Git;

/// Arguments for the `doctor` subcommand.
#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    // No subcommand-specific arguments; uses global --json flag
}

#[derive(Serialize)]
struct DoctorReport {
    config: ConfigStatus,
    git: GitStatus,
    targets: Vec<String>,
    environment: EnvironmentInfo,
}

#[derive(Serialize)]
struct ConfigStatus {
    /// Path to the project config file, if any
    file: Option<String>,
    /// Whether a project config file was found
    found: bool,
    /// User-level config directory
    user_dir: Option<String>,
}

#[derive(Serialize)]
struct GitStatus {
    /// Whether `git` is on PATH
    available: bool,
    /// Whether the working directory is inside a repository
    inside_repo: bool,
    /// Whether the working tree has no uncommitted changes
    #[serde(skip_serializing_if = "Option::is_none")]
    clean: Option<bool>,
}

#[derive(Serialize)]
struct EnvironmentInfo {
    /// Current working directory
    cwd: String,
    /// Relevant environment variables
    env_vars: Vec<EnvVar>,
}

#[derive(Serialize)]
struct EnvVar {
    name: &'static str,
    value: Option<String>,
    description: &'static str,
}

const ENV_VARS: &[(&str, &str)] = &[
    ("NUDGE_LOG_PATH", "Explicit log file path"),
    ("NUDGE_LOG_DIR", "Log directory override"),
    ("RUST_LOG", "Log filter directive"),
    ("XDG_CONFIG_HOME", "Override config directory"),
];

impl DoctorReport {
    fn gather(cwd: &Utf8Path) -> Self {
        let config_file = config::find_project_config(cwd);

        let available = nudge_core::has_binary("git");
        let git = Git::new(cwd);
        let inside_repo = available && git.is_inside_repo().unwrap_or(false);
        let clean = inside_repo.then(|| git.is_clean().ok()).flatten();

        Self {
            config: ConfigStatus {
                found: config_file.is_some(),
                file: config_file.map(|p| p.to_string()),
                user_dir: config::user_config_dir().map(|p| p.to_string()),
            },
            git: GitStatus {
                available,
                inside_repo,
                clean,
            },
            targets: bump::default_targets(cwd)
                .into_iter()
                .map(|target| {
                    target
                        .path
                        .strip_prefix(cwd)
                        .unwrap_or(&target.path)
                        .to_string()
                })
                .collect(),
            environment: EnvironmentInfo {
                cwd: cwd.to_string(),
                env_vars: ENV_VARS
                    .iter()
                    .map(|&(name, description)| EnvVar {
                        name,
                        value: std::env::var(name).ok(),
                        description,
                    })
                    .collect(),
            },
        }
    }
}

/// Run diagnostics and report configuration status.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `cwd` - Current working directory
#[instrument(name = "cmd_doctor", skip_all, fields(json_output))]
pub fn cmd_doctor(_args: DoctorArgs, global_json: bool, cwd: &Utf8Path) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing doctor command");

    let report = DoctorReport::gather(cwd);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration".bold().underline());
    match report.config.file {
        Some(ref file) => println!("  {} Config file: {}", "✓".green(), file.cyan()),
        None => println!("  {} No project config file found", "○".yellow()),
    }
    print!("  {}: ", "User config".dimmed());
    match report.config.user_dir {
        Some(ref dir) => println!("{}", dir.cyan()),
        None => println!("{}", "(unavailable)".yellow()),
    }
    println!();

    println!("{}", "Git".bold().underline());
    print_check(report.git.available, "git on PATH", "git not found (use --gitless)");
    if report.git.available {
        print_check(
            report.git.inside_repo,
            "inside a repository",
            "not inside a repository (use --gitless)",
        );
    }
    match report.git.clean {
        Some(true) => println!("  {} working tree clean", "✓".green()),
        Some(false) => println!("  {} working tree has uncommitted changes", "○".yellow()),
        None => {}
    }
    println!();

    println!("{}", "Files".bold().underline());
    if report.targets.is_empty() {
        println!("  {} No known manifests or lockfiles here", "○".yellow());
    }
    for target in &report.targets {
        println!("  {} {}", "✓".green(), target.cyan());
    }
    println!();

    println!("{}", "Environment".bold().underline());
    println!("  {}: {}", "Working directory".dimmed(), report.environment.cwd.cyan());
    let set_vars: Vec<_> = report
        .environment
        .env_vars
        .iter()
        .filter(|v| v.value.is_some())
        .collect();
    if set_vars.is_empty() {
        println!("  {} No logging/config overrides set", "○".dimmed());
    }
    for var in set_vars {
        println!(
            "  {}: {} {}",
            var.name.dimmed(),
            var.value.as_deref().unwrap_or("").cyan(),
            format!("({})", var.description).dimmed()
        );
    }

    Ok(())
}

fn print_check(ok: bool, pass: &str, fail: &str) {
    if ok {
        println!("  {} {pass}", "✓".green());
    } else {
        println!("  {} {}", "✗".red(), fail.yellow());
    }
}
