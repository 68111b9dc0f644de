pub mod links;
pub mod price;

pub use links::harvest;
pub use price::{extract_price, match_price};
