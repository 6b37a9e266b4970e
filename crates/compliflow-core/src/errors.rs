use std::fmt;

/// Failure reported by a key-value storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot persist deployment records: {0}")]
    Write(#[from] StorageError),
    #[error("deployment {name}@{version} not found")]
    NotFound { name: String, version: String },
    #[error("cannot record run for {name}@{version}: {source}")]
    InvalidRun {
        name: String,
        version: String,
        #[source]
        source: RunError,
    },
    #[error("refusing to persist unreadable deployment records: {0}")]
    Invalid(String),
}

/// A run that cannot be folded into [`crate::record::DeploymentStats`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    #[error("duration must be a non-negative finite number of milliseconds, got {0}")]
    Duration(f64),
    #[error("run counters overflow")]
    Overflow,
}

#[derive(Debug, thiserror::Error)]
pub enum PromotionError {
    #[error("deployment was not persisted: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid config: {reason}")]
    Parse { path: String, reason: String },
}

/// What a submit on the checklist produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    /// Gate predicate was false; nothing changed.
    Blocked,
    Deployed(crate::record::DeploymentRecord),
}

impl fmt::Display for PromotionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromotionOutcome::Blocked => write!(f, "Blocked: checklist incomplete"),
            PromotionOutcome::Deployed(r) => write!(f, "Deployed: {}@{}", r.name, r.version),
        }
    }
}

/// Structured check result for `cflow check --json`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckReport {
    pub file: String,
    pub pass: bool,
    pub records: usize,
    pub errors: Vec<CheckIssue>,
    pub warnings: Vec<CheckIssue>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckIssue {
    pub code: String,
    pub check: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
