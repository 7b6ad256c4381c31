//! End-to-end tests for the `pack-sync download` command.
//!
//! No content server is reachable from the tests, so every run here ends
//! with an empty bundle; they check argument handling and reporting.

#[allow(dead_code)]
mod common;
use common::prelude::*;

#[test]
fn test_download_help() {
    let mut cmd = cargo_bin_cmd!("pack-sync");
    cmd.args(["download", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--input"))
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--insecure"));
}

#[test]
fn test_download_without_server_reports_every_name() {
    let fixture = PackFixture::new();

    fixture
        .command()
        .args(["--color", "never", "download", "-o"])
        .arg(fixture.pack_path())
        .args(["-i", "HelloWorld,Phishing"])
        .assert()
        .success()
        .stderr(predicate::str::contains("FILE NAME"))
        .stderr(predicate::str::contains("REASON"))
        .stderr(predicate::str::contains("HelloWorld"))
        .stderr(predicate::str::contains("Phishing"))
        .stderr(predicate::str::contains("File not in custom content"));
}

#[test]
fn test_download_quiet_still_prints_failures() {
    let fixture = PackFixture::new();

    fixture
        .command()
        .args(["--color", "never", "download", "--quiet", "-o"])
        .arg(fixture.pack_path())
        .args(["-i", "Ghost"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Ghost"));
}

#[test]
fn test_download_rejects_unsupported_base_url() {
    let fixture = PackFixture::new();

    fixture
        .command()
        .args(["download", "--base-url", "ftp://xsoar.example.com", "-o"])
        .arg(fixture.pack_path())
        .args(["-i", "HelloWorld"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported scheme"));
}

#[test]
fn test_download_invalid_pack_path_writes_nothing() {
    let fixture = PackFixture::new();
    let not_a_pack = fixture.root().join("content");

    fixture
        .command()
        .args(["--color", "never", "download", "-o"])
        .arg(&not_a_pack)
        .args(["-i", "HelloWorld"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("content/Packs/$PACK_NAME"));

    assert!(!not_a_pack.join("Integrations").exists());
}

#[test]
fn test_download_config_from_environment() {
    let fixture = PackFixture::new();
    let config = fixture.root().join("pack-sync.yaml");
    std::fs::write(&config, "server:\n  base_url: not a url\n").unwrap();

    fixture
        .command()
        .env("PACK_SYNC_CONFIG", &config)
        .args(["download", "-o"])
        .arg(fixture.pack_path())
        .args(["-i", "HelloWorld"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid server.base_url"));
}
