//! Ratio-greedy fill and the greedy approximation ratio.

use std::cmp::Ordering;

use crate::domain::Item;
use crate::solver::Units;

/// Items in descending value/weight order, plus the integer view used to
/// fill them. Built once per (items, capacity) evaluation.
pub(crate) struct GreedyOrder {
    pub units: Units,
    pub order: Vec<usize>,
}

impl GreedyOrder {
    pub fn new(items: &[Item]) -> Self {
        let units = Units::from_items(items);
        let mut order: Vec<usize> = (0..items.len()).collect();
        // Stable sort; ratios compared exactly by cross-multiplication.
        order.sort_by(|&a, &b| compare_ratio_desc(&units, a, b));
        Self { units, order }
    }

    /// Value (in units) of filling `remaining` weight units greedily,
    /// skipping items marked in `excluded`. Items that do not fit are
    /// passed over and the scan continues.
    pub fn fill(&self, mut remaining: u64, excluded: &[bool]) -> u64 {
        let mut value = 0;
        for &i in &self.order {
            if excluded[i] {
                continue;
            }
            let w = self.units.weights[i];
            if w <= remaining {
                remaining -= w;
                value += self.units.values[i];
            }
        }
        value
    }
}

fn compare_ratio_desc(units: &Units, a: usize, b: usize) -> Ordering {
    let lhs = units.values[a] as u128 * units.weights[b] as u128;
    let rhs = units.values[b] as u128 * units.weights[a] as u128;
    rhs.cmp(&lhs)
}

/// Value reached by the ratio-greedy fill at `capacity`.
pub fn greedy_value(items: &[Item], capacity: u64) -> f64 {
    let greedy = GreedyOrder::new(items);
    let value = greedy.fill(greedy.units.capacity(capacity), &vec![false; items.len()]);
    greedy.units.value_of(value)
}

/// Greedy value divided by the optimal value; 0 when the optimum is 0.
pub fn greedy_ratio(items: &[Item], capacity: u64, optimal_value: f64) -> f64 {
    if optimal_value <= 0.0 {
        return 0.0;
    }
    (greedy_value(items, capacity) / optimal_value).clamp(0.0, 1.0)
}
