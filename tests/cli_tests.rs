//! Integration tests for the sonargate CLI
//!
//! These run the real binary. Server interaction goes through a throwaway
//! HTTP listener on localhost that serves canned JSON per API path.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::thread;
use tempfile::tempdir;

const PLUGIN_VARS: [&str; 19] = [
    "PLUGIN_SONAR_HOST",
    "PLUGIN_SONAR_TOKEN",
    "PLUGIN_TIMEOUT",
    "PLUGIN_SONAR_KEY",
    "PLUGIN_SONAR_NAME",
    "PLUGIN_BRANCH",
    "PLUGIN_PR_KEY",
    "PLUGIN_WORKSPACE",
    "PLUGIN_SKIP_SCAN",
    "PLUGIN_TASK_ID",
    "PLUGIN_WAIT_QUALITYGATE",
    "PLUGIN_QUALITYGATE",
    "PLUGIN_SONAR_QUALITY_ENABLED",
    "PLUGIN_SONAR_QUALITYGATE_TIMEOUT",
    "PLUGIN_QG_TYPE",
    "PLUGIN_JUNIT_PATH",
    "PLUGIN_SUMMARY_PATH",
    "RUST_LOG",
    "NO_COLOR",
];

const FAILING_VERDICT: &str = r#"{"projectStatus":{"status":"ERROR","conditions":[
    {"status":"OK","metricKey":"coverage","comparator":"LT","errorThreshold":"80","actualValue":"85.0"},
    {"status":"ERROR","metricKey":"new_bugs","comparator":"GT","errorThreshold":"0","actualValue":"3"}
]}}"#;

const PASSING_VERDICT: &str = r#"{"projectStatus":{"status":"OK","conditions":[
    {"status":"OK","metricKey":"coverage","comparator":"LT","errorThreshold":"80","actualValue":"85.0"}
]}}"#;

/// Test helper to get the CLI binary with a clean plugin environment
fn sonargate_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sonargate").unwrap();
    for var in PLUGIN_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir);
    cmd
}

/// Serve `routes` (path prefix, JSON body) on an ephemeral port; returns the base URL.
fn serve(routes: Vec<(&'static str, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut header = String::new();
                match reader.read_line(&mut header) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if header == "\r\n" => break,
                    Ok(_) => {}
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = routes
                .iter()
                .find(|(prefix, _)| path.starts_with(prefix))
                .map(|(_, body)| ("200 OK", *body))
                .unwrap_or(("404 Not Found", r#"{"errors":[]}"#));

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    base
}

fn write_descriptor(dir: &Path, server_url: &str) {
    let scannerwork = dir.join(".scannerwork");
    fs::create_dir_all(&scannerwork).unwrap();
    fs::write(
        scannerwork.join("report-task.txt"),
        format!(
            "projectKey=app\nserverUrl={server_url}\ndashboardUrl={server_url}/dashboard?id=app\nceTaskId=AXce\n"
        ),
    )
    .unwrap();
}

#[test]
fn test_cli_help() {
    let dir = tempdir().unwrap();
    sonargate_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("validate-config"));
}

#[test]
fn test_check_help_lists_plugin_variables() {
    let dir = tempdir().unwrap();
    sonargate_cmd(dir.path())
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PLUGIN_SONAR_HOST"))
        .stdout(predicate::str::contains("PLUGIN_SONAR_QUALITYGATE_TIMEOUT"));
}

#[test]
fn test_print_default_config() {
    let dir = tempdir().unwrap();
    sonargate_cmd(dir.path())
        .arg("print-default-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("expected_status: OK"))
        .stdout(predicate::str::contains("timeout_secs: 300"));
}

#[test]
fn test_init_config_writes_and_refuses_overwrite() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("gate.yml");

    sonargate_cmd(dir.path())
        .args(["init-config", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved"));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("junit_path"));

    sonargate_cmd(dir.path())
        .args(["init-config", "--output"])
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    sonargate_cmd(dir.path())
        .args(["init-config", "--force", "--output"])
        .arg(&output)
        .assert()
        .success();
}

#[test]
fn test_validate_config_accepts_partial_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gate.yml");
    fs::write(&path, "server:\n  host: https://sonar.example.com\ngate:\n  timeout_secs: 60\n")
        .unwrap();

    sonargate_cmd(dir.path())
        .args(["validate-config", "--detailed", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("PLUGIN_SONAR_TOKEN"));
}

#[test]
fn test_validate_config_rejects_bad_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gate.yml");
    fs::write(&path, "server:\n  host: ftp://sonar.example.com\n").unwrap();

    sonargate_cmd(dir.path())
        .args(["validate-config", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration validation failed"));
}

#[test]
fn test_check_without_host_fails() {
    let dir = tempdir().unwrap();
    sonargate_cmd(dir.path())
        .args(["check", "--quiet", "--token", "t", "--project-key", "app"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration validation failed"));
}

#[test]
fn test_check_wait_disabled_needs_no_server() {
    let dir = tempdir().unwrap();
    write_descriptor(dir.path(), "http://127.0.0.1:9");

    sonargate_cmd(dir.path())
        .args([
            "check",
            "--host",
            "http://127.0.0.1:9",
            "--token",
            "t",
            "--project-key",
            "app",
            "--wait=false",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("not evaluated"));

    assert!(!dir.path().join("sonarResults.xml").exists());
}

#[test]
fn test_check_reads_settings_from_environment() {
    let dir = tempdir().unwrap();
    write_descriptor(dir.path(), "http://127.0.0.1:9");

    sonargate_cmd(dir.path())
        .arg("check")
        .env("PLUGIN_SONAR_HOST", "http://127.0.0.1:9")
        .env("PLUGIN_SONAR_TOKEN", "t")
        .env("PLUGIN_SONAR_KEY", "org/app")
        .env("PLUGIN_WAIT_QUALITYGATE", "false")
        .assert()
        .success()
        .stdout(predicate::str::contains("org:app"));
}

#[test]
fn test_check_failing_gate_exits_non_zero_and_writes_junit() {
    let dir = tempdir().unwrap();
    let host = serve(vec![
        (
            "/api/ce/task",
            r#"{"task":{"id":"AXce","status":"SUCCESS","analysisId":"AXan"}}"#,
        ),
        ("/api/qualitygates/project_status", FAILING_VERDICT),
    ]);
    write_descriptor(dir.path(), &host);

    sonargate_cmd(dir.path())
        .args([
            "check",
            "--quiet",
            "--host",
            host.as_str(),
            "--token",
            "t",
            "--project-key",
            "app",
            "--poll-interval-ms",
            "10",
        ])
        .assert()
        .code(1);

    let xml = fs::read_to_string(dir.path().join("sonarResults.xml")).unwrap();
    assert!(xml.contains(r#"tests="2""#));
    assert!(xml.contains(r#"failures="1""#));
    assert!(xml.contains("Violated: 3 is GT 0"));
}

#[test]
fn test_check_unenforced_failure_exits_zero() {
    let dir = tempdir().unwrap();
    let host = serve(vec![
        ("/api/project_analyses/search", r#"{"analyses":[{"key":"AXlatest"}]}"#),
        ("/api/qualitygates/project_status", FAILING_VERDICT),
    ]);

    sonargate_cmd(dir.path())
        .args([
            "check",
            "--quiet",
            "--skip-scan",
            "--enforce=false",
            "--host",
            host.as_str(),
            "--token",
            "t",
            "--project-key",
            "app",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("SONAR_RESULT_TOTAL=2"))
        .stdout(predicate::str::contains("SONAR_RESULT_NEW_ERRORS=1"))
        .stdout(predicate::str::contains("Quality gate FAILED").not());

    assert!(dir.path().join("sonarResults.xml").exists());
}

#[test]
fn test_check_ignores_blank_typed_environment_values() {
    let dir = tempdir().unwrap();
    let host = serve(vec![
        (
            "/api/ce/task",
            r#"{"task":{"id":"AXce","status":"SUCCESS","analysisId":"AXan"}}"#,
        ),
        ("/api/qualitygates/project_status", PASSING_VERDICT),
    ]);
    write_descriptor(dir.path(), &host);

    sonargate_cmd(dir.path())
        .args(["check", "--quiet", "--poll-interval-ms", "10"])
        .env("PLUGIN_SONAR_HOST", host.as_str())
        .env("PLUGIN_SONAR_TOKEN", "t")
        .env("PLUGIN_SONAR_KEY", "app")
        .env("PLUGIN_TIMEOUT", "")
        .env("PLUGIN_SKIP_SCAN", "")
        .env("PLUGIN_WAIT_QUALITYGATE", "")
        .env("PLUGIN_SONAR_QUALITY_ENABLED", "")
        .env("PLUGIN_SONAR_QUALITYGATE_TIMEOUT", "")
        .env("PLUGIN_QG_TYPE", "")
        .assert()
        .success()
        .stdout(predicate::str::contains("SONAR_RESULT_PASSED=1"));

    assert!(dir.path().join("sonarResults.xml").exists());
}

#[test]
fn test_check_passing_gate_writes_summary() {
    let dir = tempdir().unwrap();
    let host = serve(vec![
        ("/api/project_analyses/search", r#"{"analyses":[{"key":"AXlatest"}]}"#),
        ("/api/qualitygates/project_status", PASSING_VERDICT),
    ]);
    let summary = dir.path().join("reports").join("summary.json");

    sonargate_cmd(dir.path())
        .args(["check", "--skip-scan", "--host", host.as_str(), "--token", "t"])
        .args(["--project-key", "app", "--summary"])
        .arg(&summary)
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality gate PASSED"))
        .stdout(predicate::str::contains("SONAR_RESULT_SUCCESS_RATE"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["status"], "OK");
    assert_eq!(json["values"]["SONAR_RESULT_PASSED"], "1");
}

#[test]
fn test_check_task_failure_reports_no_verdict() {
    let dir = tempdir().unwrap();
    let host = serve(vec![("/api/ce/task", r#"{"task":{"id":"AXce","status":"FAILED"}}"#)]);
    write_descriptor(dir.path(), &host);

    sonargate_cmd(dir.path())
        .args([
            "check",
            "--host",
            host.as_str(),
            "--token",
            "t",
            "--project-key",
            "app",
            "--poll-interval-ms",
            "10",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No quality gate verdict"));

    assert!(!dir.path().join("sonarResults.xml").exists());
}
