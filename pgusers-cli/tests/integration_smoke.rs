//! Smoke tests to verify command wiring. None of these reach a database.

use assert_cmd::Command;
use predicates::prelude::*;

/// Command running in an empty directory, so no .env or pgusers.toml applies.
/// The directory lives as long as the returned guard.
fn pgusers() -> (Command, tempfile::TempDir) {
    let mut cmd = Command::cargo_bin("pgusers").unwrap();
    // Keep the developer's own connection settings out of the tests
    for var in [
        "DATABASE_HOST",
        "DATABASE_PORT",
        "DATABASE_USER",
        "DATABASE_NAME",
        "DATABASE_PASSWORD",
    ] {
        cmd.env_remove(var);
    }
    let dir = tempfile::tempdir().unwrap();
    cmd.current_dir(dir.path());
    (cmd, dir)
}

#[test]
fn test_help_lists_subcommands() {
    let (mut cmd, _dir) = pgusers();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("add-user"))
        .stdout(predicate::str::contains("get-user"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn test_add_user_help() {
    let (mut cmd, _dir) = pgusers();
    cmd.arg("add-user")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unique username"));
}

#[test]
fn test_missing_password_is_fatal() {
    let (mut cmd, _dir) = pgusers();
    cmd.arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "You need to set the DATABASE_PASSWORD environment variable.",
        ));
}

#[test]
fn test_empty_host_fails_before_connecting() {
    let (mut cmd, _dir) = pgusers();
    cmd.env("DATABASE_PASSWORD", "secret")
        .arg("--host")
        .arg("")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing: host"))
        .stderr(predicate::str::contains("secret").not());
}

#[test]
fn test_invalid_port_is_configuration_error() {
    let (mut cmd, _dir) = pgusers();
    cmd.env("DATABASE_PASSWORD", "secret")
        .arg("--port")
        .arg("not-a-port")
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid TCP port"));
}
