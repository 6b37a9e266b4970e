#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        for ty in ["object", "array", "string", "number"] {
            let _ = compliflow_engine::inspect::format_value(&value, ty);
        }
    }
});
