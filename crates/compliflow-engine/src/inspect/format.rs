use compliflow_core::snapshot::MemoryUsage;
use serde_json::Value;

/// Memory use above this fraction of the maximum is critical.
pub const MEMORY_CRITICAL_RATIO: f64 = 0.8;
/// CPU use above this percentage is critical.
pub const CPU_CRITICAL_PERCENT: f64 = 80.0;

/// Render a variable's value by its declared type.
///
/// `object` and `array` become indented JSON, `string` is quote-wrapped,
/// anything else prints its literal form.
pub fn format_value(value: &Value, declared_type: &str) -> String {
    match declared_type {
        "object" | "array" => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        "string" => format!("\"{}\"", literal(value)),
        _ => literal(value),
    }
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn memory_critical(memory: &MemoryUsage) -> bool {
    memory.max > 0.0 && memory.current / memory.max > MEMORY_CRITICAL_RATIO
}

pub fn cpu_critical(cpu_percent: f64) -> bool {
    cpu_percent > CPU_CRITICAL_PERCENT
}
