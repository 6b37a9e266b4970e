use chrono::{DateTime, Utc};
use compliflow_core::config::SeedConfig;
use compliflow_core::errors::StoreError;
use compliflow_core::record::{DeploymentRecord, DeploymentSummary};
use compliflow_core::schema::{decode_records, encode_records, DEPLOYED_WORKFLOWS_KEY};
use compliflow_core::traits::{DeploymentRepository, KeyValueStorage};
use tracing::{debug, info, warn};

/// Repository of deployed workflows over a key-value backend.
///
/// Holds the session's in-memory sequence (most recent first) and writes the
/// whole sequence back on every change. Single writer: two processes sharing
/// a data directory overwrite each other.
pub struct DeploymentStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    seed: SeedConfig,
    records: Vec<DeploymentRecord>,
}

impl<S: KeyValueStorage> DeploymentStore<S> {
    /// Open the store under the default key, reading whatever is persisted.
    pub fn open(storage: S) -> Self {
        Self::open_with_key(storage, DEPLOYED_WORKFLOWS_KEY)
    }

    pub fn open_with_key(storage: S, key: &str) -> Self {
        let mut store = Self {
            storage,
            key: key.to_string(),
            seed: SeedConfig::default(),
            records: Vec::new(),
        };
        store.reload();
        store
    }

    /// Baseline record used by [`DeploymentRepository::seed_once`].
    pub fn with_seed(mut self, seed: SeedConfig) -> Self {
        self.seed = seed;
        self
    }

    /// Re-read persisted data, replacing the in-memory sequence.
    pub fn reload(&mut self) {
        self.records = read_records(&self.storage, &self.key);
    }

    pub fn records(&self) -> &[DeploymentRecord] {
        &self.records
    }

    /// The selected workflow for the production view: the head of the sequence.
    pub fn active(&self) -> Option<&DeploymentRecord> {
        self.records.first()
    }

    pub fn summary(&self) -> DeploymentSummary {
        DeploymentSummary::from_records(&self.records)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Fold a finished run into the stats of `name@version`.
    ///
    /// A negative or non-finite duration is rejected before anything changes.
    pub fn record_run(
        &mut self,
        name: &str,
        version: &str,
        success: bool,
        duration_ms: f64,
    ) -> Result<&DeploymentRecord, StoreError> {
        let idx = self
            .records
            .iter()
            .position(|r| r.same_release(name, version))
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
                version: version.to_string(),
            })?;
        self.records[idx]
            .stats
            .record_run(success, duration_ms)
            .map_err(|source| StoreError::InvalidRun {
                name: name.to_string(),
                version: version.to_string(),
                source,
            })?;
        debug!(name, version, success, duration_ms, "recorded run");
        self.persist()?;
        Ok(&self.records[idx])
    }

    /// Drop every record and the persisted entry.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.records.clear();
        self.storage.remove(&self.key)?;
        Ok(())
    }

    fn baseline(&self, at: DateTime<Utc>) -> DeploymentRecord {
        DeploymentRecord::new(self.seed.name.clone(), self.seed.version.clone(), at)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = encode_records(&self.records)
            .map_err(|e| StoreError::Invalid(format!("{e:#}")))?;
        self.storage.set(&self.key, &json)?;
        debug!(key = %self.key, records = self.records.len(), "persisted deployments");
        Ok(())
    }
}

impl<S: KeyValueStorage> DeploymentRepository for DeploymentStore<S> {
    fn load(&self) -> Vec<DeploymentRecord> {
        self.records.clone()
    }

    fn append(&mut self, record: DeploymentRecord) -> Result<(), StoreError> {
        check_release(&record)?;
        let before = self.records.len();
        self.records
            .retain(|r| !r.same_release(&record.name, &record.version));
        if self.records.len() != before {
            info!(
                name = %record.name,
                version = %record.version,
                "replacing earlier deployment of same version"
            );
        }
        self.records.insert(0, record);
        self.persist()
    }

    fn seed_once(&mut self) -> Result<bool, StoreError> {
        if !self.records.is_empty() {
            return Ok(false);
        }
        let record = self.baseline(Utc::now());
        check_release(&record)?;
        info!(name = %record.name, version = %record.version, "seeding baseline deployment");
        self.records.push(record);
        self.persist()?;
        Ok(true)
    }
}

/// Blank names or versions would make the whole persisted list unreadable.
fn check_release(record: &DeploymentRecord) -> Result<(), StoreError> {
    if record.name.trim().is_empty() || record.version.trim().is_empty() {
        return Err(StoreError::Invalid(format!(
            "deployment name and version must not be blank (got {:?}@{:?})",
            record.name, record.version
        )));
    }
    Ok(())
}

/// Fail-soft read: absent, unreadable, or invalid data all mean "no records".
fn read_records<S: KeyValueStorage>(storage: &S, key: &str) -> Vec<DeploymentRecord> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(key, error = %e, "deployment storage unreadable, starting empty");
            return Vec::new();
        }
    };
    match decode_records(&raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(key, error = %format!("{e:#}"), "discarding corrupt deployment data");
            Vec::new()
        }
    }
}
