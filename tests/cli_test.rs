// tests/cli_test.rs
use predicates::str::contains;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn init_git_repo(dir: &TempDir) {
    Command::new("git")
        .args(["init", "--initial-branch=main"])
        .current_dir(dir.path())
        .output()
        .expect("failed to init git repo");
}

#[test]
fn test_help_lists_subcommands() {
    assert_cmd::cargo::cargo_bin_cmd!("cdtools")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("init"))
        .stdout(contains("start-pr"))
        .stdout(contains("push-pr"))
        .stdout(contains("end-pr"));
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert_cmd::cargo::cargo_bin_cmd!("cdtools")
        .arg("publish")
        .assert()
        .failure();
}

#[test]
fn test_outside_a_repository_exits_with_one() {
    let dir = TempDir::new().unwrap();
    assert_cmd::cargo::cargo_bin_cmd!("cdtools")
        .arg("push-pr")
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(contains("Not in a git repository"));
}

#[test]
fn test_missing_config_points_at_init() {
    let dir = TempDir::new().unwrap();
    init_git_repo(&dir);
    fs::write(dir.path().join("README.md"), "demo\n").unwrap();

    for command in ["start-pr", "push-pr", "end-pr"] {
        assert_cmd::cargo::cargo_bin_cmd!("cdtools")
            .arg(command)
            .current_dir(dir.path())
            .assert()
            .code(1)
            .stderr(contains("cdtools init"));
    }
}
