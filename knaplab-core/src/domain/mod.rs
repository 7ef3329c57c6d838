//! Domain types: items, solutions and their number formatting.

pub mod item;
pub mod number;
pub mod solution;

pub use item::{from_columns, total_weight, Item, ItemId};
pub use solution::Solution;
