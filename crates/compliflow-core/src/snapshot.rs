use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ErrorType, FrameStatus, MemoryUnit, QueueStatus};

/// Point-in-time view of a workflow run, published by the run collaborator.
///
/// Every field defaults to empty/zero so an idle inspector has something to
/// render. Snapshots are replaced wholesale, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionSnapshot {
    pub variables: Vec<VariableBinding>,
    pub call_stack: Vec<StackFrame>,
    pub queued_nodes: Vec<QueuedNode>,
    pub errors: Vec<ExecutionError>,
    pub resource_usage: ResourceUsage,
}

impl ExecutionSnapshot {
    pub fn is_idle(&self) -> bool {
        self.variables.is_empty()
            && self.call_stack.is_empty()
            && self.queued_nodes.is_empty()
            && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableBinding {
    pub name: String,
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub node_id: String,
    pub node_name: String,
    pub status: FrameStatus,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedNode {
    pub node_id: String,
    pub node_name: String,
    pub status: QueueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionError {
    pub node_id: String,
    pub node_name: String,
    pub error_type: ErrorType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceUsage {
    pub memory: MemoryUsage,
    pub cpu_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryUsage {
    pub current: f64,
    pub max: f64,
    pub unit: MemoryUnit,
}
