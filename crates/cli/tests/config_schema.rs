use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)]
fn sitelink() -> Command {
    let mut cmd = Command::cargo_bin("sitelink").expect("binary");
    cmd.env_remove("SITELINK_TOP_K").arg("--quiet");
    cmd
}

fn body_of(cmd: &mut Command) -> (bool, Value) {
    let output = cmd.output().expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

#[test]
fn config_reports_layout_preset() {
    let (ok, body) = body_of(sitelink().args(["--layout", "silo", "config"]));
    assert!(ok);
    assert_eq!(body["data"]["layout"], "silo");
    assert_eq!(body["data"]["selection"]["enable_bridges"], false);
}

#[test]
fn env_override_beats_config_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("sitelink.toml");
    fs::write(&path, "[selection]\ntop_k = 8\n").unwrap();

    let (ok, body) = body_of(
        sitelink()
            .env("SITELINK_TOP_K", "3")
            .arg("--config")
            .arg(&path)
            .arg("config"),
    );
    assert!(ok, "config failed: {body}");
    assert_eq!(body["data"]["selection"]["top_k"], 3);
}

#[test]
fn unknown_config_key_is_rejected() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("sitelink.toml");
    fs::write(&path, "bogus = 1\n").unwrap();

    let (ok, body) = body_of(sitelink().arg("--config").arg(&path).arg("config"));
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap_or_default().contains("bogus"));
}

#[test]
fn schema_describes_page_documents() {
    let (ok, body) = body_of(sitelink().args(["schema", "page"]));
    assert!(ok);
    assert_eq!(body["data"]["title"], "Page");
    assert!(body["data"]["properties"]["grouping_label"].is_object());
}

#[test]
#[allow(deprecated)]
fn malformed_env_value_names_the_variable() {
    use predicates::prelude::*;

    Command::cargo_bin("sitelink")
        .expect("binary")
        .env("SITELINK_TOP_K", "six")
        .args(["--quiet", "config"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""status":"error""#))
        .stdout(predicate::str::contains("SITELINK_TOP_K"));
}
