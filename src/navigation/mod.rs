pub mod consent;
pub mod panel;
pub mod resolver;
pub mod search;


pub use resolver::{Query, Resolved, SweepPlan, resolve, resolve_with_frames, wait_for};
pub use search::SearchOptions;
