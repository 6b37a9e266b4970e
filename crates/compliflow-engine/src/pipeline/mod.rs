pub mod driver;
pub mod state;

pub use driver::PromotionPipeline;
pub use state::{reduce, PromotionEvent, PromotionRequest, PromotionState};
