use crate::errors::{StorageError, StoreError};
use crate::record::DeploymentRecord;

/// Durable string-keyed storage, the shape of a browser's local storage.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Ordered, most-recent-first collection of deployed workflows.
pub trait DeploymentRepository {
    /// Current sequence; never fails, corrupt or absent data reads as empty.
    fn load(&self) -> Vec<DeploymentRecord>;

    /// Insert at the head and persist the whole sequence.
    ///
    /// The in-memory sequence keeps the record even if persisting fails.
    fn append(&mut self, record: DeploymentRecord) -> Result<(), StoreError>;

    /// Insert the baseline record if the store is empty. Returns whether it seeded.
    fn seed_once(&mut self) -> Result<bool, StoreError>;
}

/// Receives one notification per successful promotion.
pub trait DeployNotifier {
    fn on_deploy(&mut self, record: &DeploymentRecord);
}

impl<F: FnMut(&DeploymentRecord)> DeployNotifier for F {
    fn on_deploy(&mut self, record: &DeploymentRecord) {
        self(record)
    }
}

impl<R: DeploymentRepository + ?Sized> DeploymentRepository for &mut R {
    fn load(&self) -> Vec<DeploymentRecord> {
        (**self).load()
    }

    fn append(&mut self, record: DeploymentRecord) -> Result<(), StoreError> {
        (**self).append(record)
    }

    fn seed_once(&mut self) -> Result<bool, StoreError> {
        (**self).seed_once()
    }
}
