//! Bump command: thin CLI layer over `nudge_core::bump`.

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::OwoColorize;
use tracing::{debug, instrument};

use nudge_core::bump::{self, BumpOutcome, BumpRequest, ExecuteOptions, ReleaseTransition};
use nudge_core::config::Config;
use nudge_core::git::Git;
use nudge_core::version::Level;

/// Arguments for the `bump` subcommand.
#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Which part of the version to increment
    #[arg(value_enum)]
    pub level: Level,

    /// Files to rewrite (default: package.json, package-lock.json,
    /// npm-shrinkwrap.json, pyproject.toml, uv.lock when present)
    #[arg(value_name = "FILES")]
    pub files: Vec<Utf8PathBuf>,

    /// Bump from this version instead of resolving it from tags or manifests
    #[arg(short, long, value_name = "VERSION")]
    pub base: Option<String>,

    /// Prerelease identifier (e.g., "alpha", "rc")
    #[arg(short = 'P', long, value_name = "ID")]
    pub preid: Option<String>,

    /// Replace YYYY-MM-DD stamps with today's date (or --date=YYYY-MM-DD)
    #[arg(
        short,
        long,
        value_name = "DATE",
        num_args = 0..=1,
        require_equals = true,
        value_parser = parse_date
    )]
    pub date: Option<Option<String>>,

    /// Extra substitution, sed-style: s/pattern/replacement/flags (repeatable)
    #[arg(short, long, value_name = "RULE")]
    pub replace: Vec<String>,

    /// Command to run after the files are written (repeatable)
    #[arg(short, long, value_name = "CMD")]
    pub command: Vec<String>,

    /// Extra commit message paragraph (repeatable)
    #[arg(short, long, value_name = "MSG")]
    pub message: Vec<String>,

    /// Don't read tags, commit, or tag
    #[arg(short, long)]
    pub gitless: bool,

    /// Tag prefix (default "v")
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Commit all tracked changes, not just the bumped files
    #[arg(short, long)]
    pub all: bool,

    /// Show what would happen without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

fn parse_date(value: &str) -> Result<String, String> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

impl BumpArgs {
    fn request(&self) -> BumpRequest {
        BumpRequest {
            base: self.base.clone(),
            preid: self.preid.clone(),
            files: self.files.clone(),
            date: self.date.clone().map(|date| date.unwrap_or_else(today)),
            replace: self.replace.clone(),
            gitless: self.gitless,
            tag_prefix: self.prefix.clone(),
            ..BumpRequest::new(self.level)
        }
    }

    fn execute_options(&self, config: &Config) -> ExecuteOptions {
        ExecuteOptions {
            dry_run: self.dry_run,
            commands: config
                .post_bump()
                .iter()
                .chain(&self.command)
                .cloned()
                .collect(),
            messages: config
                .messages()
                .iter()
                .chain(&self.message)
                .cloned()
                .collect(),
            all: self.all || config.commit_all(),
        }
    }
}

/// Execute the bump command.
#[instrument(name = "cmd_bump", skip_all, fields(json_output, level = %args.level))]
pub fn cmd_bump(
    args: BumpArgs,
    global_json: bool,
    config: &Config,
    cwd: &Utf8Path,
) -> anyhow::Result<()> {
    debug!(json_output = global_json, "executing bump command");

    let git = Git::new(cwd);
    let transition = bump::plan_bump(cwd, config, &args.request(), &git)
        .context("bump planning failed")?;

    if !transition.gitless
        && !args.dry_run
        && !git.is_inside_repo().context("failed to query git")?
    {
        bail!("{cwd} is not inside a git repository (use --gitless to skip commit and tag)");
    }

    if !global_json {
        print_plan(&transition, cwd);
    }

    let outcome = transition
        .execute(&args.execute_options(config), &git)
        .context("bump failed")?;

    if global_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, cwd);
    }

    Ok(())
}

fn print_plan(transition: &ReleaseTransition, cwd: &Utf8Path) {
    println!(
        "{}: {} → {}",
        "Version".bold(),
        transition.base.to_string().dimmed(),
        transition.next.to_string().green().bold()
    );
    println!("{}: {}", "Base from".dimmed(), transition.base_source);
    if !transition.gitless {
        println!("{}: {}", "Tag".dimmed(), transition.tag.cyan());
    }
    for target in &transition.targets {
        println!(
            "  {} {} {}",
            "→".dimmed(),
            display_path(&target.path, cwd).cyan(),
            format!("({})", target.format).dimmed()
        );
    }
}

fn print_outcome(outcome: &BumpOutcome, cwd: &Utf8Path) {
    println!();
    if outcome.dry_run {
        println!("{}", "Dry run: no changes made.".yellow());
        return;
    }

    println!(
        "  {} Version updated to {}",
        "✓".green(),
        outcome.new.to_string().green().bold()
    );
    for file in &outcome.files {
        println!("  {} {}", "✓".green(), display_path(&file.path, cwd));
    }
    for command in &outcome.commands {
        println!("  {} ran {}", "✓".green(), command.dimmed());
    }
    if outcome.committed {
        println!("  {} Committed", "✓".green());
    }
    if let Some(ref tag) = outcome.tag
        && outcome.tagged
    {
        println!("  {} Tagged {}", "✓".green(), tag.cyan());
    }
}

fn display_path<'a>(path: &'a Utf8Path, cwd: &Utf8Path) -> &'a str {
    path.strip_prefix(cwd).unwrap_or(path).as_str()
}
