#![forbid(unsafe_code)]

pub mod gates;
pub mod inspect;
pub mod pipeline;
pub mod store;
