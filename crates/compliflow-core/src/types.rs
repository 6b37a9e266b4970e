use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Lifecycle status of a deployment record.
///
/// Unknown status strings survive a load/save cycle as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentStatus {
    Active,
    Inactive,
    Failed,
    Other(String),
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeploymentStatus::Active => "active",
            DeploymentStatus::Inactive => "inactive",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for DeploymentStatus {
    fn from(s: &str) -> Self {
        match s {
            "active" => DeploymentStatus::Active,
            "inactive" => DeploymentStatus::Inactive,
            "failed" => DeploymentStatus::Failed,
            other => DeploymentStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeploymentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DeploymentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DeploymentStatus::from(s.as_str()))
    }
}

/// One of the three boolean gates on the deployment checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChecklistItem {
    EvaluationPassed,
    ApprovalObtained,
    NodesValidated,
}

impl ChecklistItem {
    pub const ALL: [ChecklistItem; 3] = [
        ChecklistItem::EvaluationPassed,
        ChecklistItem::ApprovalObtained,
        ChecklistItem::NodesValidated,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChecklistItem::EvaluationPassed => "evaluation passed",
            ChecklistItem::ApprovalObtained => "approval obtained",
            ChecklistItem::NodesValidated => "nodes validated",
        }
    }
}

impl fmt::Display for ChecklistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Running,
    Completed,
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Queued,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryUnit {
    #[default]
    #[serde(rename = "MB")]
    Mb,
    #[serde(rename = "GB")]
    Gb,
}

impl fmt::Display for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryUnit::Mb => f.write_str("MB"),
            MemoryUnit::Gb => f.write_str("GB"),
        }
    }
}
