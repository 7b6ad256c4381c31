//! End-to-end tests for CLI exit codes.
//!
//! - Exit code 0: The run finished, even when some items were not downloaded
//! - Exit code 1: The output path is not a pack, or the configuration is bad
//! - Exit code 2: Invalid command-line usage (handled by clap)

#[allow(dead_code)]
mod common;
use common::prelude::*;

/// Exit code 0 is returned for --help.
#[test]
fn test_exit_code_help() {
    let mut cmd = cargo_bin_cmd!("pack-sync");

    cmd.arg("--help").assert().code(0);
}

/// Exit code 0 is returned for --version.
#[test]
fn test_exit_code_version() {
    let mut cmd = cargo_bin_cmd!("pack-sync");

    cmd.arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// Exit code 1 is returned when the output path is not a pack.
#[test]
fn test_exit_code_invalid_pack_path() {
    let fixture = PackFixture::new();

    fixture
        .command()
        .args(["--color", "never", "download", "-o"])
        .arg(fixture.root())
        .args(["-i", "HelloWorld"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("is not a valid pack path"));
}

/// Exit code 1 is returned for a configuration file that does not parse.
#[test]
fn test_exit_code_invalid_config() {
    let fixture = PackFixture::new();
    let config = fixture.root().join("pack-sync.yaml");
    std::fs::write(&config, "unknown_section: true\n").unwrap();

    fixture
        .command()
        .args(["download", "-o"])
        .arg(fixture.pack_path())
        .args(["-i", "HelloWorld", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration parsing error"));
}

/// Exit code 0 is returned when items fail but the run completes.
#[test]
fn test_exit_code_partial_failure_is_success() {
    let fixture = PackFixture::new();

    fixture
        .command()
        .args(["--color", "never", "download", "-o"])
        .arg(fixture.pack_path())
        .args(["-i", "Ghost"])
        .assert()
        .code(0);
}

/// Exit code 2 is returned for missing required arguments.
#[test]
fn test_exit_code_missing_arguments() {
    let mut cmd = cargo_bin_cmd!("pack-sync");

    cmd.args(["download", "-o", "somewhere"]).assert().code(2);
}

/// Exit code 2 is returned for an unknown subcommand.
#[test]
fn test_exit_code_unknown_subcommand() {
    let mut cmd = cargo_bin_cmd!("pack-sync");

    cmd.arg("upload").assert().code(2);
}
