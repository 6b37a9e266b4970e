use chrono::{DateTime, Duration, TimeZone, Utc};
use compliflow_core::snapshot::{
    ExecutionError, ExecutionSnapshot, MemoryUsage, QueuedNode, ResourceUsage, StackFrame,
    VariableBinding,
};
use compliflow_core::types::{ErrorType, FrameStatus, MemoryUnit, QueueStatus};
use serde_json::json;

/// Nodes of the demo claims-review workflow, in execution order.
const DEMO_NODES: [(&str, &str); 5] = [
    ("ingest", "Ingest Claims"),
    ("normalize", "Normalize Records"),
    ("score", "Score Fraud Risk"),
    ("review", "Compliance Review"),
    ("report", "File Regulatory Report"),
];

const DEMO_MEMORY_MAX_MB: f64 = 512.0;

/// Deterministic snapshot of the demo run at `tick`.
///
/// Stands in for a real run engine: each tick completes one more node, memory
/// climbs toward the limit, and a warning appears once scoring has run.
pub fn demo_snapshot(tick: u64) -> ExecutionSnapshot {
    let total = DEMO_NODES.len();
    let done = usize::try_from(tick).unwrap_or(usize::MAX).min(total);
    let started = demo_epoch();

    let mut call_stack = Vec::new();
    for (i, (id, name)) in DEMO_NODES.iter().enumerate().take((done + 1).min(total)) {
        let status = if i < done {
            FrameStatus::Completed
        } else {
            FrameStatus::Running
        };
        call_stack.push(StackFrame {
            node_id: (*id).to_string(),
            node_name: (*name).to_string(),
            status,
            depth: i.min(2) as u32,
        });
    }

    let running = if done < total { Some(DEMO_NODES[done].0) } else { None };
    let queued_nodes = DEMO_NODES
        .iter()
        .skip(done + 1)
        .enumerate()
        .map(|(offset, (id, name))| {
            let (status, blocked_by) = match (offset, running) {
                (0, Some(r)) => (QueueStatus::Blocked, Some(r.to_string())),
                _ => (QueueStatus::Queued, None),
            };
            QueuedNode {
                node_id: (*id).to_string(),
                node_name: (*name).to_string(),
                status,
                blocked_by,
            }
        })
        .collect();

    let mut variables = vec![
        VariableBinding {
            name: "claimsProcessed".into(),
            value: json!(tick.saturating_mul(125)),
            declared_type: "number".into(),
        },
        VariableBinding {
            name: "jurisdiction".into(),
            value: json!("EU"),
            declared_type: "string".into(),
        },
    ];
    if done > 2 {
        variables.push(VariableBinding {
            name: "riskScores".into(),
            value: json!({"high": 3, "medium": 11, "low": 111}),
            declared_type: "object".into(),
        });
    }

    let mut errors = Vec::new();
    if done > 2 {
        errors.push(ExecutionError {
            node_id: "score".into(),
            node_name: "Score Fraud Risk".into(),
            error_type: ErrorType::Warning,
            message: "3 claims exceeded the manual-review threshold".into(),
            timestamp: started + Duration::seconds(3),
        });
    }

    let current = (192.0 + 64.0 * tick as f64).min(DEMO_MEMORY_MAX_MB);
    let cpu_percent = if done < total {
        tick.saturating_mul(15).saturating_add(30).min(95) as f64
    } else {
        5.0
    };

    ExecutionSnapshot {
        variables,
        call_stack,
        queued_nodes,
        errors,
        resource_usage: ResourceUsage {
            memory: MemoryUsage {
                current,
                max: DEMO_MEMORY_MAX_MB,
                unit: MemoryUnit::Mb,
            },
            cpu_percent,
        },
    }
}

fn demo_epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0)
        .single()
        .unwrap_or_default()
}
