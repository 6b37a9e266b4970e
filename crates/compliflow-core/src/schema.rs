use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use jsonschema::Validator;
use serde_json::Value;

use crate::errors::{CheckIssue, CheckReport};
use crate::record::DeploymentRecord;

const SCHEMA_V1: &str = include_str!("../schema/deployed-workflows.schema.json");

/// Storage key under which the deployed-workflow list is persisted.
pub const DEPLOYED_WORKFLOWS_KEY: &str = "deployed-workflows";

/// Create a validator for the persisted record list.
pub fn validator() -> Result<Validator> {
    let schema: Value =
        serde_json::from_str(SCHEMA_V1).context("embedded schema is invalid JSON")?;
    Validator::new(&schema).map_err(|e| anyhow::anyhow!("schema compilation failed: {e}"))
}

/// Validate a persisted record list.
pub fn validate(data: &Value) -> Result<()> {
    let v = validator()?;
    if v.is_valid(data) {
        return Ok(());
    }
    let mut msgs: Vec<String> = Vec::new();
    for error in v.iter_errors(data) {
        let path = error.instance_path.to_string();
        let loc = if path.is_empty() {
            "(root)".into()
        } else {
            path
        };
        msgs.push(format!("  {loc}: {error}"));
    }
    bail!("validation failed:\n{}", msgs.join("\n"));
}

/// Decode the raw stored payload: parse, schema-check, deserialize.
///
/// This is the only place persisted data is interpreted; callers that want
/// fail-soft behaviour map any error here to an empty list.
pub fn decode_records(raw: &str) -> Result<Vec<DeploymentRecord>> {
    let data: Value = serde_json::from_str(raw).context("invalid JSON")?;
    validate(&data)?;
    serde_json::from_value(data).context("records do not match the deployment layout")
}

/// Encode records in the persisted layout, refusing any payload
/// [`decode_records`] would reject.
pub fn encode_records(records: &[DeploymentRecord]) -> Result<String> {
    let data = serde_json::to_value(records).context("cannot encode records")?;
    validate(&data)?;
    serde_json::to_string_pretty(&data).context("cannot encode records")
}

/// Full check producing a structured report (for `cflow check --json`).
pub fn check(data: &Value, file: &str) -> CheckReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    match validator() {
        Ok(v) => {
            for error in v.iter_errors(data) {
                let p = error.instance_path.to_string();
                errors.push(CheckIssue {
                    code: "E001".into(),
                    check: "schema".into(),
                    message: error.to_string(),
                    path: Some(if p.is_empty() { "(root)".into() } else { p }),
                });
            }
        }
        Err(e) => errors.push(CheckIssue {
            code: "E000".into(),
            check: "schema".into(),
            message: e.to_string(),
            path: None,
        }),
    }

    let records: Vec<DeploymentRecord> = if errors.is_empty() {
        match serde_json::from_value(data.clone()) {
            Ok(r) => r,
            Err(e) => {
                errors.push(CheckIssue {
                    code: "E002".into(),
                    check: "decode".into(),
                    message: e.to_string(),
                    path: None,
                });
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let mut seen = HashSet::new();
    for (i, r) in records.iter().enumerate() {
        if !seen.insert((r.name.as_str(), r.version.as_str())) {
            warnings.push(CheckIssue {
                code: "W001".into(),
                check: "duplicates".into(),
                message: format!("{}@{} deployed more than once", r.name, r.version),
                path: Some(format!("/{i}")),
            });
        }
    }
    for (i, pair) in records.windows(2).enumerate() {
        if pair[0].deployed_at < pair[1].deployed_at {
            warnings.push(CheckIssue {
                code: "W002".into(),
                check: "ordering".into(),
                message: format!(
                    "{} is older than the record after it; list is not most-recent-first",
                    pair[0].name
                ),
                path: Some(format!("/{i}")),
            });
        }
    }

    CheckReport {
        file: file.to_string(),
        pass: errors.is_empty(),
        records: records.len(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, version: &str, at: &str) -> Value {
        json!({
            "name": name,
            "version": version,
            "status": "active",
            "deployedAt": at,
            "stats": {"runs": 0, "successCount": 0, "avgDurationMs": 0}
        })
    }

    #[test]
    fn decodes_valid_list() {
        let raw = json!([record("Claims Detection", "1.0.0", "2024-03-01T09:30:00Z")]).to_string();
        let records = decode_records(&raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Claims Detection");
    }

    #[test]
    fn encode_refuses_what_decode_would_reject() {
        let at = chrono::DateTime::parse_from_rfc3339("2024-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let good = DeploymentRecord::new("Claims Detection", "1.0.0", at);
        let raw = encode_records(std::slice::from_ref(&good)).unwrap();
        assert_eq!(decode_records(&raw).unwrap(), vec![good.clone()]);

        let blank = DeploymentRecord::new("  ", "1.0.0", at);
        assert!(encode_records(&[good.clone(), blank]).is_err());

        let mut nan = good;
        nan.stats.avg_duration_ms = f64::NAN;
        assert!(encode_records(&[nan]).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(decode_records("[{not json").is_err());
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(decode_records(r#"{"name":"x"}"#).is_err());
    }

    #[test]
    fn rejects_blank_version() {
        let raw = json!([record("Claims Detection", "   ", "2024-03-01T09:30:00Z")]).to_string();
        assert!(decode_records(&raw).is_err());
    }

    #[test]
    fn rejects_bad_timestamp_after_schema() {
        let raw = json!([record("Claims Detection", "1.0.0", "yesterday")]).to_string();
        let err = decode_records(&raw).unwrap_err();
        assert!(err.to_string().contains("deployment layout"));
    }

    #[test]
    fn check_flags_duplicates_and_ordering() {
        let data = json!([
            record("A", "1", "2024-01-01T00:00:00Z"),
            record("A", "1", "2024-02-01T00:00:00Z"),
        ]);
        let report = check(&data, "deployed-workflows.json");
        assert!(report.pass);
        assert_eq!(report.records, 2);
        let codes: Vec<_> = report.warnings.iter().map(|w| w.code.as_str()).collect();
        assert_eq!(codes, vec!["W001", "W002"]);
    }

    #[test]
    fn check_reports_schema_errors() {
        let data = json!([{"name": "A"}]);
        let report = check(&data, "bad.json");
        assert!(!report.pass);
        assert!(report.errors.iter().all(|e| e.check == "schema"));
    }
}
