//! Integration tests for the `stashly` CLI binary.
//!
//! Argument parsing and config errors run without a server; the entity
//! commands run against a wiremock server on a blocking thread.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `stashly` binary with env isolation.
///
/// Clears the `STASHLY_*` vars the CLI reads and points config
/// directories at a nonexistent path so tests never read a real config.
fn stashly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("stashly");
    cmd.env("HOME", "/tmp/stashly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/stashly-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("STASHLY_CONFIG")
        .env_remove("STASHLY_URL")
        .env_remove("STASHLY_OUTPUT")
        .env_remove("STASHLY_INSECURE")
        .env_remove("STASHLY_TIMEOUT")
        .env_remove("STASHLY_SERVER__URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a configured command off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = stashly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    stashly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("get-all")
            .and(predicate::str::contains("query"))
            .and(predicate::str::contains("delete"))
            .and(predicate::str::contains("entities")),
    );
}

#[test]
fn test_version_flag() {
    stashly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stashly"));
}

#[test]
fn test_unknown_output_format_is_usage_error() {
    stashly_cmd()
        .args(["-o", "yaml", "entities"])
        .assert()
        .code(2);
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_missing_config_file_errors() {
    stashly_cmd()
        .args(["--config", "/tmp/stashly-cli-test-nonexistent/nope.toml", "entities"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.toml"));
}

#[test]
fn test_entities_lists_configured_types() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        r#"
[entities.Hero]
collection_path = "heroes"
sort_field = "name"

[entities.Villain]
id_field = "code"
"#,
    )
    .unwrap();

    stashly_cmd()
        .args(["--config", config.to_str().unwrap(), "-o", "plain", "entities"])
        .assert()
        .success()
        .stdout("Hero\nVillain\n");
}

#[test]
fn test_invalid_query_pair_is_usage_error() {
    let output = stashly_cmd()
        .args(["--url", "http://127.0.0.1:1/api", "query", "Hero", "novalue"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("name=value"));
}

// ── Entity commands ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_get_all_prints_entities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hero/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Windstorm" },
            { "id": 2, "name": "Bombasto" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = stashly_cmd();
    cmd.args(["--url", &format!("{}/api", server.uri()), "-o", "plain", "get-all", "Hero"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_entity_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/hero/7"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut cmd = stashly_cmd();
    cmd.args(["--url", &format!("{}/api", server.uri()), "get", "Hero", "7"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_prints_server_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/hero/"))
        .and(body_json(json!({ "name": "Magneta" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 42, "name": "Magneta" })))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = stashly_cmd();
    cmd.args([
        "--url",
        &format!("{}/api", server.uri()),
        "-o",
        "json-compact",
        "add",
        "Hero",
        r#"{"name":"Magneta"}"#,
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed, json!({ "id": 42, "name": "Magneta" }));
}

#[test]
fn test_unreachable_server_exits_connection() {
    let output = stashly_cmd()
        .args(["--url", "http://127.0.0.1:1/api", "--timeout", "2", "delete", "Hero", "1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
