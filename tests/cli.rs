// ABOUTME: Integration tests for the gantry CLI commands.
// ABOUTME: Validates --help output, init behavior, and failure exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn gantry_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("gantry"))
}

const MINIMAL_CONFIG: &str = r#"
resource_group: rg1
registry: acr1
image: app:v1
identity: sp1
"#;

#[test]
fn help_shows_commands() {
    gantry_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("up"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("gantry.yml");

    gantry_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(config_path.exists(), "gantry.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("image:"), "Config should have image field");
    assert!(
        content.contains("registry:"),
        "Config should have registry field"
    );
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("gantry.yml");

    fs::write(&config_path, "existing: config").unwrap();

    gantry_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_force_overwrites() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("gantry.yml");

    fs::write(&config_path, "existing: config").unwrap();

    gantry_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--force", "--registry", "customacr"])
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("customacr"));
}

#[test]
fn up_without_config_exits_one() {
    let temp_dir = tempfile::tempdir().unwrap();

    gantry_cmd()
        .current_dir(temp_dir.path())
        .arg("up")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn check_prints_resolved_parameters() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("gantry.yml"), MINIMAL_CONFIG).unwrap();

    gantry_cmd()
        .current_dir(temp_dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("acr1"))
        .stdout(predicate::str::contains("eastus"));
}

#[test]
fn check_rejects_invalid_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("gantry.yml"),
        "resource_group: rg1\nregistry: acr1\nimage: app:v1\nidentity: sp1\ndns_label: Bad_Label\n",
    )
    .unwrap();

    gantry_cmd()
        .current_dir(temp_dir.path())
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("dns_label"));
}
