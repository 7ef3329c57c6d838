//! Exact 0/1 knapsack solver (bounded-capacity dynamic programming).
//!
//! `dp[i][c]` is the best value using the first `i` items within capacity
//! `c`. The recurrence only takes item `i` when that is strictly better, so
//! ties resolve to "not taken". Backtracking marks item `i` as selected when
//! `dp[i][c] != dp[i-1][c]`, then restores the original item order.
//!
//! The table works on exact integers. Numbers are converted to units with
//! scale 1 when every weight (or value) is integral, and scale 100 otherwise:
//! two-decimal inputs become exact integers, and a user capacity `C` maps to
//! `C · weight_scale` columns.

use tracing::debug;

use crate::domain::number::is_integral;
use crate::domain::{Item, Solution};

/// Scale used for columns that contain two-decimal numbers.
pub const DECIMAL_SCALE: u64 = 100;

/// Integer view of an item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Units {
    pub weight_scale: u64,
    pub value_scale: u64,
    pub weights: Vec<u64>,
    pub values: Vec<u64>,
}

impl Units {
    pub fn from_items(items: &[Item]) -> Self {
        let weight_scale = column_scale(items.iter().map(|i| i.weight));
        let value_scale = column_scale(items.iter().map(|i| i.value));
        Self {
            weight_scale,
            value_scale,
            weights: items.iter().map(|i| to_units(i.weight, weight_scale)).collect(),
            values: items.iter().map(|i| to_units(i.value, value_scale)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Capacity in weight units.
    pub fn capacity(&self, capacity: u64) -> u64 {
        capacity.saturating_mul(self.weight_scale)
    }

    /// A value expressed in value units.
    pub fn value_units(&self, value: f64) -> u64 {
        to_units(value, self.value_scale)
    }

    pub fn value_of(&self, units: u64) -> f64 {
        units as f64 / self.value_scale as f64
    }

    pub fn weight_of(&self, units: u64) -> f64 {
        units as f64 / self.weight_scale as f64
    }
}

fn column_scale(mut numbers: impl Iterator<Item = f64>) -> u64 {
    if numbers.all(is_integral) {
        1
    } else {
        DECIMAL_SCALE
    }
}

fn to_units(x: f64, scale: u64) -> u64 {
    let scaled = (x * scale as f64).round();
    if scaled <= 0.0 {
        0
    } else {
        scaled as u64
    }
}

/// A filled DP table for capacities `0..=max_capacity`.
///
/// Row `i` of the table does not depend on the table width, so the optimum
/// for any capacity up to `max_capacity` can be read back from one table
/// with the same tie-break as a dedicated solve.
pub struct DpTable<'a> {
    items: &'a [Item],
    units: Units,
    max_capacity: u64,
    /// Total weight in units; wider columns would repeat the last one.
    total_weight: u64,
    width: usize,
    cells: Vec<u64>,
}

impl<'a> DpTable<'a> {
    pub fn build(items: &'a [Item], max_capacity: u64) -> Self {
        let units = Units::from_items(items);
        if units.weight_scale != 1 {
            debug!(
                event = "scaled_weights",
                scale = units.weight_scale,
                max_capacity,
                "continuous weights: DP columns scaled"
            );
        }
        let total_weight: u64 = units.weights.iter().sum();
        let width = units.capacity(max_capacity).min(total_weight) as usize + 1;
        let n = items.len();
        let mut cells = vec![0u64; (n + 1) * width];

        for i in 1..=n {
            let w = units.weights[i - 1] as usize;
            let v = units.values[i - 1];
            let (prev_rows, cur_rows) = cells.split_at_mut(i * width);
            let prev = &prev_rows[(i - 1) * width..];
            let cur = &mut cur_rows[..width];
            for c in 0..width {
                let skip = prev[c];
                cur[c] = if w <= c {
                    let take = prev[c - w] + v;
                    if take > skip {
                        take
                    } else {
                        skip
                    }
                } else {
                    skip
                };
            }
        }

        Self {
            items,
            units,
            max_capacity,
            total_weight,
            width,
            cells,
        }
    }

    pub fn max_capacity(&self) -> u64 {
        self.max_capacity
    }

    pub fn units(&self) -> &Units {
        &self.units
    }

    /// Optimal solution at `capacity`, or `None` beyond the table width.
    pub fn solution_at(&self, capacity: u64) -> Option<Solution> {
        if capacity > self.max_capacity {
            return None;
        }
        Some(self.backtrack(self.column(capacity)))
    }

    /// Column for `capacity`: every capacity at or above the total weight
    /// fits all items, so it reads the last column.
    fn column(&self, capacity: u64) -> usize {
        self.units.capacity(capacity).min(self.total_weight) as usize
    }

    fn cell(&self, row: usize, col: usize) -> u64 {
        self.cells[row * self.width + col]
    }

    fn backtrack(&self, capacity_units: usize) -> Solution {
        let n = self.items.len();
        let mut col = capacity_units;
        let mut picked = Vec::new();
        for i in (1..=n).rev() {
            if self.cell(i, col) != self.cell(i - 1, col) {
                picked.push(i - 1);
                col -= self.units.weights[i - 1] as usize;
            }
        }
        picked.reverse();

        let weight_units: u64 = picked.iter().map(|&i| self.units.weights[i]).sum();
        let value_units = self.cell(n, capacity_units);
        Solution {
            value: self.units.value_of(value_units),
            weight: self.units.weight_of(weight_units),
            count: picked.len(),
            items: picked.iter().map(|&i| self.items[i]).collect(),
        }
    }
}

/// Solve the 0/1 knapsack for one integer capacity.
pub fn solve(items: &[Item], capacity: u64) -> Solution {
    let table = DpTable::build(items, capacity);
    table.backtrack(table.column(capacity))
}
