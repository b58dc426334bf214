use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ENV_KEYS: &[&str] = &[
    "SITELINK_TOP_K",
    "SITELINK_MIN_BRIDGE",
    "SITELINK_MIN_FUNNEL",
    "SITELINK_SEM_MIN",
    "SITELINK_CTX_MIN",
    "SITELINK_CONF_MIN",
    "SITELINK_INTENT_REQUIRED",
];

#[allow(deprecated)]
fn run_select(workdir: &Path, extra: &[&str]) -> (bool, Value) {
    let mut cmd = Command::cargo_bin("sitelink").expect("binary");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    let output = cmd
        .current_dir(workdir)
        .arg("--quiet")
        .arg("select")
        .arg("--architecture-id")
        .arg("arch-1")
        .arg("--pages")
        .arg("pages.json")
        .args(extra)
        .output()
        .expect("command run");

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

fn setup_site() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(
        root.join("pages.json"),
        r#"[
          {"id": "p-laptopy", "display_name": "Laptopy", "grouping_label": "Laptopy", "path": "/laptopy/"},
          {"id": "p-gaming", "display_name": "Laptopy Gaming", "grouping_label": "Laptopy Gaming", "path": "/laptopy/gaming/", "intent": "commercial"},
          {"id": "p-ekspresy", "display_name": "Ekspresy do kawy", "grouping_label": "Ekspresy do kawy", "path": "/agd/ekspresy/", "intent": "informational"},
          {"id": "p-kup", "display_name": "Kup ekspres", "grouping_label": "Kup ekspres", "path": "/agd/ekspresy/kup/", "intent": "transactional"}
        ]"#,
    )
    .unwrap();
    fs::write(
        root.join("hierarchy.json"),
        r#"[{"from": {"label": "Laptopy"}, "to": {"label": "Laptopy Gaming"}, "anchor_text": "laptopy do gier"}]"#,
    )
    .unwrap();
    fs::write(
        root.join("bridges.json"),
        r#"[{
          "from_ref": {"cluster": "Laptopy Gaming"},
          "to_ref": {"url": "/agd/ekspresy/"},
          "suggested_anchor": "ekspres do biura",
          "similarity_score": 92,
          "serp_similarity": 0.85,
          "intent_match": true
        }]"#,
    )
    .unwrap();
    fs::write(
        root.join("funnels.json"),
        r#"[{
          "from": {"path": "/agd/ekspresy/"},
          "to": {"path": "/agd/ekspresy/kup/"},
          "anchor_text": "kup teraz",
          "semantic_relevance": 0.9,
          "contextual_relevance": 0.8
        }]"#,
    )
    .unwrap();
    temp
}

const ALL_STREAMS: &[&str] = &[
    "--hierarchy",
    "hierarchy.json",
    "--bridges",
    "bridges.json",
    "--funnels",
    "funnels.json",
];

fn link_types(body: &Value) -> Vec<String> {
    body["data"]["links"]
        .as_array()
        .expect("links array")
        .iter()
        .map(|link| link["link_type"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn select_writes_link_set_to_store() {
    let temp = setup_site();
    let root = temp.path();

    let mut args = ALL_STREAMS.to_vec();
    args.extend(["--out-dir", "links"]);
    let (ok, body) = run_select(root, &args);
    assert!(ok, "select failed: {body}");
    assert_eq!(body["status"], "ok");

    let mut types = link_types(&body);
    types.sort();
    assert_eq!(types, vec!["bridge", "funnel", "hierarchy"]);
    assert_eq!(body["data"]["stats"]["total"], 3);

    let stored_path = root.join("links").join("arch-1.links.json");
    let stored: Value = serde_json::from_slice(&fs::read(&stored_path).unwrap()).unwrap();
    assert_eq!(stored["digest"], body["data"]["digest"]);
    assert_eq!(stored["links"], body["data"]["links"]);
    assert!(body["data"]["stored_at"]
        .as_str()
        .unwrap_or_default()
        .ends_with("arch-1.links.json"));
}

#[test]
fn select_is_deterministic_across_runs() {
    let temp = setup_site();
    let (_, first) = run_select(temp.path(), ALL_STREAMS);
    let (_, second) = run_select(temp.path(), ALL_STREAMS);
    assert_eq!(first["data"]["digest"], second["data"]["digest"]);
    assert!(first["data"].get("stored_at").is_none());
}

#[test]
fn unreadable_bridge_stream_is_reported_not_fatal() {
    let temp = setup_site();
    let (ok, body) = run_select(
        temp.path(),
        &[
            "--hierarchy",
            "hierarchy.json",
            "--bridges",
            "missing.json",
            "--funnels",
            "funnels.json",
        ],
    );
    assert!(ok, "select failed: {body}");
    assert_eq!(
        body["data"]["stats"]["unavailable_sources"],
        serde_json::json!(["bridge"])
    );
    let types = link_types(&body);
    assert!(!types.contains(&"bridge".to_string()));
    assert!(types.contains(&"funnel".to_string()));
}

#[test]
fn silo_layout_keeps_bridges_out() {
    let temp = setup_site();
    let mut args = vec!["--layout", "silo"];
    args.extend_from_slice(ALL_STREAMS);
    let (ok, body) = run_select(temp.path(), &args);
    assert!(ok, "select failed: {body}");
    let types = link_types(&body);
    assert!(!types.contains(&"bridge".to_string()));
    assert!(types.contains(&"hierarchy".to_string()));
}

#[test]
fn missing_catalog_fails_the_run() {
    let temp = tempdir().unwrap();
    let (ok, body) = run_select(temp.path(), &[]);
    assert!(!ok, "expected non-zero exit without a catalog");
    assert_eq!(body["status"], "error");
    let message = body["message"].as_str().unwrap_or_default();
    assert!(message.contains("arch-1"), "unexpected message: {message}");
}
