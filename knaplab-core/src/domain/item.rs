//! Knapsack items.

use serde::{Deserialize, Serialize};

/// 1-based item id, assigned by position in the generated sequence.
pub type ItemId = u32;

/// A single knapsack item. Weight and value are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(serialize_with = "super::number::serialize")]
    pub weight: f64,
    #[serde(serialize_with = "super::number::serialize")]
    pub value: f64,
}

impl Item {
    pub fn new(id: ItemId, weight: f64, value: f64) -> Self {
        Self { id, weight, value }
    }

    /// Value per unit of weight.
    pub fn ratio(&self) -> f64 {
        self.value / self.weight
    }
}

/// Build items from parallel weight/value columns, ids 1..=n.
pub fn from_columns(weights: &[f64], values: &[f64]) -> Vec<Item> {
    weights
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (&w, &v))| Item::new(i as ItemId + 1, w, v))
        .collect()
}

pub fn total_weight(items: &[Item]) -> f64 {
    items.iter().map(|i| i.weight).sum()
}
