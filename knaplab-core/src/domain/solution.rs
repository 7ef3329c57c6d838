//! Solver output.

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId};

/// An optimal selection for one (item set, capacity) pair.
///
/// `items` keeps the original relative order of the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    #[serde(serialize_with = "super::number::serialize")]
    pub value: f64,
    #[serde(serialize_with = "super::number::serialize")]
    pub weight: f64,
    pub count: usize,
    pub items: Vec<Item>,
}

impl Solution {
    pub fn empty() -> Self {
        Self {
            value: 0.0,
            weight: 0.0,
            count: 0,
            items: Vec::new(),
        }
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }
}
