pub mod atomic;
pub mod records;
pub mod storage;

pub use records::DeploymentStore;
pub use storage::{FileStorage, MemoryStorage};
