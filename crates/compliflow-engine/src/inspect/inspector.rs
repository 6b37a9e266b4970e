use std::fmt::Write;

use compliflow_core::snapshot::ExecutionSnapshot;
use compliflow_core::types::{ErrorType, FrameStatus, QueueStatus};

use super::format::{cpu_critical, format_value, memory_critical};

/// Collapsible panel over the latest snapshot from the run collaborator.
///
/// Collapsing hides the panel but keeps the snapshot.
#[derive(Debug, Clone, Default)]
pub struct Inspector {
    snapshot: ExecutionSnapshot,
    open: bool,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale.
    pub fn receive(&mut self, snapshot: ExecutionSnapshot) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &ExecutionSnapshot {
        &self.snapshot
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// The panel text, or `None` while collapsed.
    pub fn render(&self) -> Option<String> {
        self.open.then(|| render_snapshot(&self.snapshot))
    }
}

/// Lay out a snapshot as a plain-text panel.
pub fn render_snapshot(snapshot: &ExecutionSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Variables ({})", snapshot.variables.len());
    for var in &snapshot.variables {
        let value = format_value(&var.value, &var.declared_type);
        let value = value.replace('\n', "\n    ");
        let _ = writeln!(out, "  {} <{}> = {value}", var.name, var.declared_type);
    }

    let _ = writeln!(out, "\nCall Stack ({})", snapshot.call_stack.len());
    for frame in &snapshot.call_stack {
        let indent = "  ".repeat(frame.depth as usize + 1);
        let marker = match frame.status {
            FrameStatus::Running => "running",
            FrameStatus::Completed => "completed",
            FrameStatus::Waiting => "waiting",
        };
        let _ = writeln!(
            out,
            "{indent}{} [{}] {marker}",
            frame.node_name, frame.node_id
        );
    }

    let _ = writeln!(out, "\nQueue ({})", snapshot.queued_nodes.len());
    for node in &snapshot.queued_nodes {
        match (node.status, &node.blocked_by) {
            (QueueStatus::Blocked, Some(by)) => {
                let _ = writeln!(out, "  {} [{}] blocked by {by}", node.node_name, node.node_id);
            }
            (QueueStatus::Blocked, None) => {
                let _ = writeln!(out, "  {} [{}] blocked", node.node_name, node.node_id);
            }
            (QueueStatus::Queued, _) => {
                let _ = writeln!(out, "  {} [{}] queued", node.node_name, node.node_id);
            }
        }
    }

    let _ = writeln!(out, "\nErrors ({})", snapshot.errors.len());
    for err in &snapshot.errors {
        let kind = match err.error_type {
            ErrorType::Error => "ERROR",
            ErrorType::Warning => "WARN",
        };
        let _ = writeln!(
            out,
            "  {kind} {} [{}] at {}: {}",
            err.node_name,
            err.node_id,
            err.timestamp.to_rfc3339(),
            err.message
        );
    }

    let usage = &snapshot.resource_usage;
    let mem_flag = if memory_critical(&usage.memory) {
        " CRITICAL"
    } else {
        ""
    };
    let cpu_flag = if cpu_critical(usage.cpu_percent) {
        " CRITICAL"
    } else {
        ""
    };
    let _ = writeln!(out, "\nResources");
    let _ = writeln!(
        out,
        "  memory: {}/{} {}{mem_flag}",
        usage.memory.current, usage.memory.max, usage.memory.unit
    );
    let _ = writeln!(out, "  cpu: {}%{cpu_flag}", usage.cpu_percent);

    out
}
