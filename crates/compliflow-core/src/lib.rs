#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod record;
pub mod schema;
pub mod snapshot;
pub mod traits;
pub mod types;
