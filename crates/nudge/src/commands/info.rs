//! Info command: show package, config, base version and target files.

use camino::Utf8Path;
use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use nudge_core::bump;
use nudge_core::config::{self, Config};
use nudge_core::format::FileTarget;
use nudge_core::git::Git;
use nudge_core::version::resolve::{ResolveRequest, ResolvedVersion, resolve_base_version};

/// Arguments for the `info` subcommand.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    /// Resolve the base version without reading git tags
    #[arg(short, long)]
    pub gitless: bool,
}

#[derive(Serialize)]
struct PackageInfo {
    name: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    repository: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    license: &'static str,
}

impl PackageInfo {
    const fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            repository: env!("CARGO_PKG_REPOSITORY"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

#[derive(Serialize)]
struct ConfigInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<String>,
    log_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    log_dir: Option<String>,
    tag_prefix: String,
    gitless: bool,
}

impl ConfigInfo {
    fn from_config(config: &Config, cwd: &Utf8Path) -> Self {
        Self {
            config_file: config::find_project_config(cwd).map(|p| p.to_string()),
            log_level: config.log_level.as_str().to_string(),
            log_dir: config.log_dir.as_ref().map(|p| p.to_string()),
            tag_prefix: config.tag_prefix().to_string(),
            gitless: config.gitless(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum BaseInfo {
    Resolved(ResolvedVersion),
    Error(String),
}

#[derive(Serialize)]
struct FullInfo {
    #[serde(flatten)]
    package: PackageInfo,
    config: ConfigInfo,
    base: BaseInfo,
    targets: Vec<FileTarget>,
}

impl FullInfo {
    fn gather(args: &InfoArgs, config: &Config, cwd: &Utf8Path) -> Self {
        let git = Git::new(cwd);
        let base = match resolve_base_version(
            &ResolveRequest {
                explicit_base: None,
                gitless: args.gitless || config.gitless(),
                project_root: cwd,
                tag_prefix: config.tag_prefix(),
                fallback: config.fallback(),
            },
            &git,
        ) {
            Ok(resolved) => BaseInfo::Resolved(resolved),
            Err(err) => BaseInfo::Error(err.to_string()),
        };

        Self {
            package: PackageInfo::new(),
            config: ConfigInfo::from_config(config, cwd),
            base,
            targets: bump::default_targets(cwd),
        }
    }
}

/// Print package information and what a bump would start from.
///
/// # Arguments
/// * `global_json` - Global `--json` flag from CLI
/// * `config` - Loaded configuration
/// * `cwd` - Current working directory for config discovery and resolution
#[instrument(name = "cmd_info", skip_all, fields(json_output))]
pub fn cmd_info(
    args: InfoArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing info command");

    let info = FullInfo::gather(&args, config, cwd);

    if global_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!(
        "{} {}",
        info.package.name.bold(),
        info.package.version.green()
    );
    if !info.package.description.is_empty() {
        println!("{}", info.package.description);
    }
    if !info.package.license.is_empty() {
        println!("{}: {}", "License".dimmed(), info.package.license);
    }
    if !info.package.repository.is_empty() {
        println!(
            "{}: {}",
            "Repository".dimmed(),
            info.package.repository.cyan()
        );
    }

    println!();
    println!("{}", "Configuration".bold().underline());
    if let Some(ref path) = info.config.config_file {
        println!("{}: {}", "Config file".dimmed(), path.cyan());
    } else {
        println!("{}: {}", "Config file".dimmed(), "none loaded".yellow());
    }
    println!("{}: {}", "Log level".dimmed(), info.config.log_level);
    if let Some(ref dir) = info.config.log_dir {
        println!("{}: {}", "Log directory".dimmed(), dir);
    }
    println!("{}: {}", "Tag prefix".dimmed(), info.config.tag_prefix.cyan());
    println!("{}: {}", "Gitless".dimmed(), info.config.gitless);

    println!();
    println!("{}", "Base Version".bold().underline());
    match info.base {
        BaseInfo::Resolved(ref resolved) => println!(
            "  {} {} {}",
            "✓".green(),
            resolved.version.to_string().green().bold(),
            format!("(from {})", resolved.source).dimmed()
        ),
        BaseInfo::Error(ref err) => println!("  {} {}", "✗".red(), err.yellow()),
    }

    println!();
    println!("{}", "Default Targets".bold().underline());
    if info.targets.is_empty() {
        println!("  {} {}", "○".yellow(), "No known manifests found".yellow());
    }
    for target in &info.targets {
        let path = target.path.strip_prefix(cwd).unwrap_or(&target.path);
        println!(
            "  {} {} {}",
            "→".dimmed(),
            path.cyan(),
            format!("({})", target.format).dimmed()
        );
    }

    Ok(())
}
