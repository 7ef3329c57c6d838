//! Exhaustive bundle statistics.
//!
//! Every non-empty subset is enumerated by bitmask, so this is only run for
//! item sets of at most [`MAX_BUNDLE_ITEMS`] items (about a million subsets).

use serde::{Deserialize, Serialize};

use crate::domain::Item;
use crate::solver::Units;

pub const MAX_BUNDLE_ITEMS: usize = 20;

pub const DEFAULT_ALPHA_PERCENT: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleStats {
    /// Non-empty subsets whose weight fits the capacity.
    pub feasible: u64,
    /// Feasible subsets reaching `alpha_percent`% of the optimum.
    pub n90: u64,
    pub alpha_percent: u32,
}

impl BundleStats {
    /// `n90 / feasible`, or 0 when nothing is feasible.
    pub fn n90_share(&self) -> f64 {
        if self.feasible == 0 {
            0.0
        } else {
            self.n90 as f64 / self.feasible as f64
        }
    }
}

/// Count feasible and near-optimal bundles; `None` above [`MAX_BUNDLE_ITEMS`].
pub fn bundle_stats(
    items: &[Item],
    capacity: u64,
    optimal_value: f64,
    alpha_percent: u32,
) -> Option<BundleStats> {
    let n = items.len();
    if n > MAX_BUNDLE_ITEMS {
        return None;
    }
    let units = Units::from_items(items);
    let capacity = units.capacity(capacity);
    let threshold = alpha_percent as u128 * units.value_units(optimal_value) as u128;

    let mut feasible = 0u64;
    let mut n90 = 0u64;
    for mask in 1u32..(1u32 << n) {
        let mut weight = 0u64;
        let mut value = 0u64;
        let mut bits = mask;
        while bits != 0 {
            let i = bits.trailing_zeros() as usize;
            weight += units.weights[i];
            value += units.values[i];
            bits &= bits - 1;
        }
        if weight > capacity {
            continue;
        }
        feasible += 1;
        if 100 * value as u128 >= threshold {
            n90 += 1;
        }
    }

    Some(BundleStats {
        feasible,
        n90,
        alpha_percent,
    })
}
