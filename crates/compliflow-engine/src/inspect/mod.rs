pub mod format;
pub mod inspector;
pub mod simulate;

pub use format::{cpu_critical, format_value, memory_critical};
pub use inspector::{render_snapshot, Inspector};
