//! CLI conformance tests: promotion, store, and inspector via the JSON interface.

use test_helpers::{cflow_json, cflow_stdout, run};

use serde_json::json;

const ALL_CHECKS: [&str; 3] = [
    "--evaluation-passed",
    "--approval-obtained",
    "--nodes-validated",
];

fn deploy_args<'a>(name: &'a str, version: &'a str, checks: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["deploy", "--name", name, "--version", version, "--json"];
    args.extend_from_slice(checks);
    args
}

// ── Store seeding (3) ───────────────────────────────────────────

#[test]
fn fresh_store_is_seeded_with_one_active_record() {
    let dir = tempfile::tempdir().unwrap();
    let v = cflow_json(dir.path(), &["list", "--json"], 0);
    let records = v.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["status"], "active");
    assert_eq!(records[0]["name"], "Claims Detection");
}

#[test]
fn seeding_twice_keeps_one_record() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run(dir.path(), &["seed"]).status.success());
    assert!(run(dir.path(), &["seed"]).status.success());
    let v = cflow_json(dir.path(), &["list", "--json"], 0);
    assert_eq!(v.as_array().unwrap().len(), 1);
}

#[test]
fn corrupt_store_file_reads_as_empty_and_reseeds() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("deployed-workflows.json"), "[{\"name\": ").unwrap();

    let v = cflow_json(dir.path(), &["list", "--json"], 0);
    let records = v.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Claims Detection");
}

// ── Promotion (6) ───────────────────────────────────────────────

#[test]
fn promote_with_full_checklist() {
    let dir = tempfile::tempdir().unwrap();
    let deployed = cflow_json(
        dir.path(),
        &deploy_args("Claims Detection v2", "2.0.0", &ALL_CHECKS),
        0,
    );
    assert_eq!(deployed["name"], "Claims Detection v2");
    assert_eq!(deployed["version"], "2.0.0");
    assert_eq!(deployed["status"], "active");
    assert_eq!(
        deployed["stats"],
        json!({"runs": 0, "successCount": 0, "avgDurationMs": 0.0})
    );

    let list = cflow_json(dir.path(), &["list", "--json"], 0);
    let records = list.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0], deployed);

    let status = cflow_json(dir.path(), &["status", "--json"], 0);
    assert_eq!(status["active"]["name"], "Claims Detection v2");
    assert_eq!(status["summary"]["deployments"], 2);
}

#[test]
fn missing_approval_blocks_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let v = cflow_json(
        dir.path(),
        &deploy_args(
            "Claims Detection v2",
            "2.0.0",
            &["--evaluation-passed", "--nodes-validated"],
        ),
        1,
    );
    assert_eq!(v["deployed"], false);
    assert_eq!(v["outstanding"], json!(["approvalObtained"]));
    assert_eq!(v["versionMissing"], false);

    let list = cflow_json(dir.path(), &["list", "--json"], 0);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn blank_version_blocks_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let v = cflow_json(dir.path(), &deploy_args("Claims Detection v2", "  ", &ALL_CHECKS), 1);
    assert_eq!(v["versionMissing"], true);
    assert_eq!(v["outstanding"], json!([]));
}

#[test]
fn missing_name_uses_configured_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("cflow.json");
    std::fs::write(&config, r#"{"default_workflow_name": "Prototype Draft"}"#).unwrap();

    let mut args = vec![
        "--config",
        config.to_str().unwrap(),
        "deploy",
        "--version",
        "0.1",
        "--json",
    ];
    args.extend_from_slice(&ALL_CHECKS);
    let v = cflow_json(dir.path(), &args, 0);
    assert_eq!(v["name"], "Prototype Draft");
}

#[test]
fn blank_configured_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("cflow.json");
    for body in [
        r#"{"default_workflow_name": "   "}"#,
        r#"{"seed": {"name": ""}}"#,
    ] {
        std::fs::write(&config, body).unwrap();
        let out = run(dir.path(), &["--config", config.to_str().unwrap(), "seed"]);
        assert!(!out.status.success(), "{body}");
        assert!(String::from_utf8_lossy(&out.stderr).contains("must not be blank"));
    }
    assert!(!dir.path().join("data/deployed-workflows.json").exists());
}

#[test]
fn redeploying_same_version_does_not_duplicate() {
    let dir = tempfile::tempdir().unwrap();
    cflow_json(dir.path(), &deploy_args("Fraud Triage", "1.0", &ALL_CHECKS), 0);
    cflow_json(dir.path(), &deploy_args("Fraud Triage", "1.1", &ALL_CHECKS), 0);
    cflow_json(dir.path(), &deploy_args("Fraud Triage", "1.0", &ALL_CHECKS), 0);

    let list = cflow_json(dir.path(), &["list", "--json"], 0);
    let versions: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["version"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(versions, vec!["1.0", "1.1", "1.0.0"]);
}

// ── Run stats (3) ───────────────────────────────────────────────

#[test]
fn record_run_updates_active_stats() {
    let dir = tempfile::tempdir().unwrap();
    cflow_json(dir.path(), &deploy_args("Fraud Triage", "1.0", &ALL_CHECKS), 0);
    let args = |flag: &'static str, ms: &'static str| {
        vec![
            "record-run",
            "--name",
            "Fraud Triage",
            "--version",
            "1.0",
            flag,
            "--duration-ms",
            ms,
        ]
    };
    cflow_json(dir.path(), &args("--success", "100"), 0);
    let v = cflow_json(dir.path(), &args("--failure", "300"), 0);
    assert_eq!(v["stats"]["runs"], 2);
    assert_eq!(v["stats"]["successCount"], 1);
    assert_eq!(v["stats"]["avgDurationMs"], 200.0);

    let status = cflow_json(dir.path(), &["status", "--json"], 0);
    assert_eq!(status["summary"]["totalRuns"], 2);
    assert_eq!(status["summary"]["successRate"], 0.5);
}

#[test]
fn record_run_unknown_workflow_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(
        dir.path(),
        &[
            "record-run",
            "--name",
            "Nope",
            "--version",
            "1",
            "--success",
            "--duration-ms",
            "5",
        ],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("not found"));
}

#[test]
fn record_run_rejects_bad_duration_and_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    cflow_json(dir.path(), &deploy_args("Fraud Triage", "1.0", &ALL_CHECKS), 0);
    for ms in ["--duration-ms=-5", "--duration-ms=NaN", "--duration-ms=inf"] {
        let out = run(
            dir.path(),
            &["record-run", "--name", "Fraud Triage", "--version", "1.0", "--success", ms],
        );
        assert!(!out.status.success(), "{ms}");
        assert!(String::from_utf8_lossy(&out.stderr).contains("duration"));
    }

    let list = cflow_json(dir.path(), &["list", "--json"], 0);
    let records = list.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["stats"]["runs"], 0);
}

// ── Inspector (3) ───────────────────────────────────────────────

#[test]
fn inspect_file_formats_values() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("snapshot.json");
    let payload = json!({
        "variables": [
            {"name": "x", "value": {"a": 1}, "type": "object"},
            {"name": "s", "value": "hi", "type": "string"}
        ],
        "resourceUsage": {"memory": {"current": 400, "max": 512, "unit": "MB"}, "cpuPercent": 12}
    });
    std::fs::write(&snapshot, payload.to_string()).unwrap();

    let out = cflow_stdout(dir.path(), &["inspect", snapshot.to_str().unwrap()]);
    assert!(out.contains("x <object> = {\n      \"a\": 1\n    }"), "{out}");
    assert!(out.contains("s <string> = \"hi\""), "{out}");
    assert!(out.contains("memory: 400/512 MB\n"), "{out}");
    assert!(!out.contains("CRITICAL"), "{out}");
}

#[test]
fn inspect_demo_flags_pressure() {
    let dir = tempfile::tempdir().unwrap();
    let out = cflow_stdout(dir.path(), &["inspect", "--demo", "4"]);
    assert!(out.contains("memory: 448/512 MB CRITICAL"), "{out}");
    assert!(out.contains("cpu: 90% CRITICAL"), "{out}");
    assert!(out.contains("WARN Score Fraud Risk"), "{out}");
}

#[test]
fn inspect_collapsed_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = cflow_stdout(dir.path(), &["inspect", "--demo", "1", "--collapsed"]);
    assert!(out.is_empty());
}

// ── Check (2) ───────────────────────────────────────────────────

#[test]
fn check_accepts_store_written_by_cflow() {
    let dir = tempfile::tempdir().unwrap();
    cflow_json(dir.path(), &deploy_args("Fraud Triage", "1.0", &ALL_CHECKS), 0);
    let file = dir.path().join("data").join("deployed-workflows.json");
    let v = cflow_json(dir.path(), &["check", file.to_str().unwrap(), "--json"], 0);
    assert_eq!(v["pass"], true);
    assert_eq!(v["records"], 2);
}

#[test]
fn check_rejects_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.json");
    std::fs::write(&file, r#"[{"name": "A", "version": "1"}]"#).unwrap();
    let v = cflow_json(dir.path(), &["check", file.to_str().unwrap(), "--json"], 1);
    assert_eq!(v["pass"], false);
    assert!(!v["errors"].as_array().unwrap().is_empty());
}
