//! End-to-end CLI tests for the tag-exporter binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Runs the binary isolated from any config on the host.
fn isolated(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tag-exporter").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("tag-exporter").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export documents grouped by tag"))
        .stdout(predicate::str::contains("--export-dir"));
}

#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("tag-exporter").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tag-exporter"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("tag-exporter").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_without_config_fails() {
    let home = TempDir::new().unwrap();
    isolated(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No config file found"));
}

#[test]
fn test_binary_rejects_invalid_config() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("tag-exporter.toml"),
        "[api]\nurl = \"ftp://dms.example.com\"\ntoken = \"secret\"\n\n[export]\ndirectory = \".\"\n",
    )
    .unwrap();

    isolated(home.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("api.url"));
}

#[test]
fn test_binary_rejects_missing_export_directory() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    fs::write(
        &config,
        "[api]\nurl = \"https://dms.example.com/api\"\ntoken = \"secret\"\n\n[export]\ndirectory = \"/nonexistent/tag-exporter\"\n",
    )
    .unwrap();

    isolated(home.path())
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[tokio::test]
async fn test_binary_runs_export_against_server() {
    let server = MockServer::start().await;
    for endpoint in ["tags", "documents", "custom_fields"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/{endpoint}/")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"next": null, "results": []})),
            )
            .mount(&server)
            .await;
    }

    let home = TempDir::new().unwrap();
    let export = home.path().join("export");
    let logs = home.path().join("logs");
    fs::create_dir(&export).unwrap();
    fs::write(
        home.path().join("tag-exporter.toml"),
        format!(
            "[api]\nurl = \"{}/api\"\ntoken = \"secret\"\n\n[export]\ndirectory = \"{}\"\n\n[log]\ndirectory = \"{}\"\n",
            server.uri(),
            export.display(),
            logs.display()
        ),
    )
    .unwrap();

    isolated(home.path()).arg("-q").assert().success();

    let all = export.join("ALLDocs");
    let reports: Vec<_> = fs::read_dir(&all)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".xlsx"))
        .collect();
    assert_eq!(reports.len(), 1);

    let run_logs: Vec<_> = fs::read_dir(&logs)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(run_logs.len(), 1);
    assert!(run_logs[0].starts_with("##tag-exporter__"));
    assert!(!run_logs[0].ends_with(".progress.log"));
}
