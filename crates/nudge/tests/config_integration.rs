//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, precedence, and the
//! effect of config keys on bumps, using the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Run `info --json --gitless` in `dir` and parse the report.
fn info_json(dir: &Path) -> serde_json::Value {
    let output = cmd()
        .arg("-C")
        .arg(dir)
        .args(["--json", "info", "--gitless"])
        .assert()
        .success();
    serde_json::from_slice(&output.get_output().stdout).expect("info --json emits JSON")
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(tmp.path());
    assert!(json["config"]["config_file"].is_null());
    assert_eq!(json["config"]["log_level"], "warn");
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nudge.toml"), r#"log_level = "error""#).unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "error");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".nudge.toml")
    );
}

#[test]
fn discovers_regular_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("nudge.toml"), r#"log_level = "error""#).unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "error");
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".nudge.toml"), r#"log_level = "error""#).unwrap();

    let json = info_json(&sub_dir);
    assert_eq!(json["config"]["log_level"], "error");
}

#[test]
fn dotfile_takes_precedence_over_regular_name() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.toml"),
        "[git]\ntag_prefix = \"dot-\"\n",
    )
    .unwrap();
    fs::write(
        tmp.path().join("nudge.toml"),
        "[git]\ntag_prefix = \"plain-\"\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["tag_prefix"], "dot-");
}

#[test]
fn explicit_config_flag_is_loaded() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "[git]\ntag_prefix = \"custom-\"\n").unwrap();

    let output = cmd()
        .arg("-C")
        .arg(tmp.path())
        .arg("--config")
        .arg(&config)
        .args(["--json", "info", "--gitless"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(json["config"]["tag_prefix"], "custom-");
}

// =============================================================================
// Config Format Parsing
// =============================================================================

#[test]
fn parses_yaml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.yaml"),
        "git:\n  tag_prefix: yaml-\n  gitless: true\n",
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["tag_prefix"], "yaml-");
    assert_eq!(json["config"]["gitless"], true);
}

#[test]
fn parses_yml_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nudge.yml"), "log_level: error\n").unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "error");
}

#[test]
fn parses_json_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.json"),
        r#"{"git": {"tag_prefix": "json-"}}"#,
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["tag_prefix"], "json-");
}

// =============================================================================
// Config Precedence
// =============================================================================

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("project");
    fs::create_dir_all(&sub_dir).unwrap();

    fs::write(tmp.path().join(".nudge.toml"), "[git]\ntag_prefix = \"outer-\"\n").unwrap();
    fs::write(sub_dir.join(".nudge.toml"), "[git]\ntag_prefix = \"inner-\"\n").unwrap();

    let json = info_json(&sub_dir);
    assert_eq!(json["config"]["tag_prefix"], "inner-");
}

#[test]
fn toml_preferred_over_yaml_in_same_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nudge.toml"), "[git]\ntag_prefix = \"toml-\"\n").unwrap();
    fs::write(tmp.path().join(".nudge.yaml"), "git:\n  tag_prefix: yaml-\n").unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["tag_prefix"], "toml-");
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nudge.toml"), "this is not valid toml [[[").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_yaml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.yaml"),
        "invalid:\n  yaml\n content:\n[broken",
    )
    .unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nudge.json"), "{not valid json}").unwrap();

    cmd()
        .args(["-C", tmp.path().to_str().unwrap(), "info"])
        .assert()
        .failure();
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.toml"),
        r#"
log_level = "error"
unknown_field = "should be ignored"
another_unknown = 42
"#,
    )
    .unwrap();

    let json = info_json(tmp.path());
    assert_eq!(json["config"]["log_level"], "error");
}

// =============================================================================
// Boundary Marker Tests
// =============================================================================

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();

    // parent/.nudge.toml + parent/repo/.git/ + parent/repo/src/
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(parent.join(".nudge.toml"), r#"log_level = "error""#).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();

    let json = info_json(&src);
    assert!(json["config"]["config_file"].is_null());
    assert_eq!(json["config"]["log_level"], "warn");
}

#[test]
fn config_in_same_dir_as_git_is_found() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(repo.join(".nudge.toml"), r#"log_level = "error""#).unwrap();

    let json = info_json(&src);
    assert_eq!(json["config"]["log_level"], "error");
}

// =============================================================================
// Config Effects on Bumps
// =============================================================================

#[test]
fn configured_gitless_skips_git() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nudge.toml"), "[git]\ngitless = true\n").unwrap();
    fs::write(tmp.path().join("VERSION"), "1.0.0\n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["bump", "patch", "--base", "1.0.0", "VERSION"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(tmp.path().join("VERSION")).unwrap(), "1.0.1\n");
}

#[test]
fn configured_files_replace_defaults() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.toml"),
        "files = [\"VERSION\"]\n\n[git]\ngitless = true\n",
    )
    .unwrap();
    fs::write(tmp.path().join("VERSION"), "2.0.0\n").unwrap();
    fs::write(tmp.path().join("package.json"), r#"{"version": "2.0.0"}"#).unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["bump", "major"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(tmp.path().join("VERSION")).unwrap(), "3.0.0\n");
    assert_eq!(
        fs::read_to_string(tmp.path().join("package.json")).unwrap(),
        r#"{"version": "2.0.0"}"#
    );
}

#[test]
fn configured_replace_rules_run_before_cli_rules() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.toml"),
        "replace = [\"s/stage=\\\\w+/stage=one/\"]\n\n[git]\ngitless = true\n",
    )
    .unwrap();
    fs::write(tmp.path().join("VERSION"), "1.0.0 stage=zero\n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["bump", "patch", "-b", "1.0.0", "-r", "s/stage=one/stage=two/", "VERSION"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(tmp.path().join("VERSION")).unwrap(),
        "1.0.1 stage=two\n"
    );
}

#[test]
fn zero_fallback_starts_from_nothing() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nudge.toml"),
        "[version]\ngitless_fallback = \"zero\"\n\n[git]\ngitless = true\n",
    )
    .unwrap();
    fs::write(tmp.path().join("VERSION"), "0.0.0\n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["bump", "minor", "VERSION"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(tmp.path().join("VERSION")).unwrap(), "0.1.0\n");
}

#[test]
fn without_fallback_an_unversioned_project_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), "0.0.0\n").unwrap();

    cmd()
        .arg("-C")
        .arg(tmp.path())
        .args(["bump", "minor", "--gitless", "VERSION"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("error:"));

    assert_eq!(fs::read_to_string(tmp.path().join("VERSION")).unwrap(), "0.0.0\n");
}
