#![no_main]
use compliflow_core::schema::DEPLOYED_WORKFLOWS_KEY;
use compliflow_core::traits::DeploymentRepository;
use compliflow_engine::store::{DeploymentStore, MemoryStorage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut store = DeploymentStore::open(MemoryStorage::with_entry(DEPLOYED_WORKFLOWS_KEY, s));
        let _ = store.seed_once();
        assert!(!store.load().is_empty());
    }
});
