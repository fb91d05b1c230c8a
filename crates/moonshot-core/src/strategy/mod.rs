//! Investment Strategy
//!
//! Sentiment-to-size mapping and the allocation planner built on it.

mod buffer;
mod multiplier;
mod planner;

pub use buffer::{MAX_BUFFER, buffer_fraction};
pub use multiplier::multiplier;
pub use planner::{AllocationPlanner, Sizing};
