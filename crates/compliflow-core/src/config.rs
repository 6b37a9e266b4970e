use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Config file consulted when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = ".compliflow/config.json";

/// Placeholder name for a workflow the editor has not named.
pub const DEFAULT_WORKFLOW_NAME: &str = "Untitled Workflow";

/// Workspace settings for `cflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CflowConfig {
    /// Directory holding one JSON file per storage key.
    pub data_dir: PathBuf,
    /// Name used when the editor supplies no workflow name.
    pub default_workflow_name: String,
    pub seed: SeedConfig,
}

/// The baseline deployment inserted into an empty store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub name: String,
    pub version: String,
}

impl Default for CflowConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".compliflow"),
            default_workflow_name: DEFAULT_WORKFLOW_NAME.to_string(),
            seed: SeedConfig::default(),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            name: "Claims Detection".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

impl CflowConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_PATH`] if it exists.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: display.clone(),
            reason: e.to_string(),
        })?;
        config.validate().map_err(|reason| ConfigError::Parse {
            path: display,
            reason,
        })?;
        Ok(config)
    }

    /// Names that end up in persisted records must not be blank.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("default_workflow_name", &self.default_workflow_name),
            ("seed.name", &self.seed.name),
            ("seed.version", &self.seed.version),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(format!("{field} must not be blank"));
            }
        }
        Ok(())
    }
}
