//! Hardness metrics for a solved (items, capacity) pair.

pub mod bundles;
pub mod greedy;
pub mod sahni;

pub use bundles::{bundle_stats, BundleStats, DEFAULT_ALPHA_PERCENT, MAX_BUNDLE_ITEMS};
pub use greedy::{greedy_ratio, greedy_value};
pub use sahni::{sahni_k, SahniK, SAHNI_K_CAP};

use serde::{Deserialize, Serialize};

use crate::domain::{Item, Solution};

/// Every hardness measure for one capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hardness {
    pub sahni_k: SahniK,
    pub greedy_ratio: f64,
    pub bundles: Option<BundleStats>,
}

/// Evaluate all metrics against an already computed optimum.
///
/// Bundle statistics are skipped when `with_bundles` is false; they are the
/// expensive part and the search only needs them when a bundle constraint
/// is active.
pub fn assess(
    items: &[Item],
    capacity: u64,
    optimum: &Solution,
    with_bundles: bool,
    alpha_percent: u32,
) -> Hardness {
    Hardness {
        sahni_k: sahni_k(items, capacity, optimum.value),
        greedy_ratio: greedy_ratio(items, capacity, optimum.value),
        bundles: if with_bundles {
            bundle_stats(items, capacity, optimum.value, alpha_percent)
        } else {
            None
        },
    }
}
