use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RunError;
use crate::types::DeploymentStatus;

/// One promoted workflow version, as persisted under the deployed-workflows key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub name: String,
    pub version: String,
    pub status: DeploymentStatus,
    pub deployed_at: DateTime<Utc>,
    #[serde(default)]
    pub stats: DeploymentStats,
}

impl DeploymentRecord {
    /// A freshly promoted record: active, zeroed stats.
    pub fn new(name: impl Into<String>, version: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            status: DeploymentStatus::Active,
            deployed_at: at,
            stats: DeploymentStats::default(),
        }
    }

    /// True if this record is the same `(name, version)` pair.
    pub fn same_release(&self, name: &str, version: &str) -> bool {
        self.name == name && self.version == version
    }
}

/// Run counters for a deployed workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStats {
    pub runs: u64,
    pub success_count: u64,
    pub avg_duration_ms: f64,
}

impl DeploymentStats {
    /// Fold one finished run into the counters (running mean for duration).
    ///
    /// On error the counters are left untouched.
    pub fn record_run(&mut self, success: bool, duration_ms: f64) -> Result<(), RunError> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(RunError::Duration(duration_ms));
        }
        let runs = self.runs.checked_add(1).ok_or(RunError::Overflow)?;
        let success_count = if success {
            self.success_count.checked_add(1).ok_or(RunError::Overflow)?
        } else {
            self.success_count
        };
        let avg = self.avg_duration_ms + (duration_ms - self.avg_duration_ms) / runs as f64;
        if !avg.is_finite() || avg < 0.0 {
            return Err(RunError::Overflow);
        }
        self.runs = runs;
        self.success_count = success_count;
        self.avg_duration_ms = avg;
        Ok(())
    }

    /// Fraction of successful runs, `None` before the first run.
    pub fn success_rate(&self) -> Option<f64> {
        if self.runs == 0 {
            None
        } else {
            Some(self.success_count as f64 / self.runs as f64)
        }
    }
}

/// Aggregate view over every deployed record, for the production dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSummary {
    pub deployments: usize,
    pub active: usize,
    pub total_runs: u64,
    pub total_successes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
    pub avg_duration_ms: f64,
}

impl DeploymentSummary {
    pub fn from_records(records: &[DeploymentRecord]) -> Self {
        let mut summary = DeploymentSummary {
            deployments: records.len(),
            ..Default::default()
        };
        for r in records {
            if r.status == DeploymentStatus::Active {
                summary.active += 1;
            }
            if r.stats.runs == 0 {
                continue;
            }
            summary.total_runs = summary.total_runs.saturating_add(r.stats.runs);
            summary.total_successes = summary
                .total_successes
                .saturating_add(r.stats.success_count);
            // Weighted running mean; the plain weighted sum can overflow.
            let weight = r.stats.runs as f64 / summary.total_runs as f64;
            summary.avg_duration_ms +=
                (r.stats.avg_duration_ms - summary.avg_duration_ms) * weight;
        }
        if summary.total_runs > 0 {
            summary.success_rate =
                Some(summary.total_successes as f64 / summary.total_runs as f64);
        }
        summary
    }
}
