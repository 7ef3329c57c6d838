//! Sahni-k hardness metric.
//!
//! The smallest `k` such that forcing some `k` items into the knapsack and
//! completing greedily by value/weight ratio reaches the optimum. `k = 0` is
//! plain greedy. Enumeration costs `C(n, k)` greedy fills per level, so the
//! search stops at [`SAHNI_K_CAP`].

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::greedy::GreedyOrder;
use crate::domain::Item;

pub const SAHNI_K_CAP: u8 = 6;

const EXCEEDED_LABEL: &str = "more than 6";

/// Result of the Sahni-k search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SahniK {
    Exact(u8),
    /// No forced subset of size up to the cap reaches the optimum.
    Exceeded,
}

impl SahniK {
    pub fn exact(&self) -> Option<u8> {
        match self {
            Self::Exact(k) => Some(*k),
            Self::Exceeded => None,
        }
    }
}

impl fmt::Display for SahniK {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(k) => write!(f, "{k}"),
            Self::Exceeded => f.write_str(EXCEEDED_LABEL),
        }
    }
}

impl Serialize for SahniK {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exact(k) => serializer.serialize_u8(*k),
            Self::Exceeded => serializer.serialize_str(EXCEEDED_LABEL),
        }
    }
}

impl<'de> Deserialize<'de> for SahniK {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SahniVisitor;

        impl<'de> Visitor<'de> for SahniVisitor {
            type Value = SahniK;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an integer 0..={SAHNI_K_CAP} or \"{EXCEEDED_LABEL}\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SahniK, E> {
                if v <= SAHNI_K_CAP as u64 {
                    Ok(SahniK::Exact(v as u8))
                } else {
                    Err(E::custom(format!("sahni_k {v} exceeds {SAHNI_K_CAP}")))
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SahniK, E> {
                if v < 0 {
                    return Err(E::custom("sahni_k must be non-negative"));
                }
                self.visit_u64(v as u64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SahniK, E> {
                if v == EXCEEDED_LABEL {
                    Ok(SahniK::Exceeded)
                } else {
                    Err(E::custom(format!("unknown sahni_k label '{v}'")))
                }
            }
        }

        deserializer.deserialize_any(SahniVisitor)
    }
}

/// Compute Sahni-k for `items` at `capacity`, given the optimal value.
pub fn sahni_k(items: &[Item], capacity: u64, optimal_value: f64) -> SahniK {
    let greedy = GreedyOrder::new(items);
    let search = ForcedSearch {
        greedy: &greedy,
        capacity: greedy.units.capacity(capacity),
        target: greedy.units.value_units(optimal_value),
    };
    let n = items.len();
    let mut forced = vec![false; n];

    for k in 0..=SAHNI_K_CAP as usize {
        if k > n {
            break;
        }
        if search.any_reaches(k, 0, &mut forced, 0, 0) {
            return SahniK::Exact(k as u8);
        }
    }
    SahniK::Exceeded
}

struct ForcedSearch<'a> {
    greedy: &'a GreedyOrder,
    capacity: u64,
    target: u64,
}

impl ForcedSearch<'_> {
    /// Does some completion of the current forced prefix, with `left` more
    /// items chosen from `start..`, reach the target? Lexicographic order;
    /// returns at the first success.
    fn any_reaches(
        &self,
        left: usize,
        start: usize,
        forced: &mut [bool],
        weight: u64,
        value: u64,
    ) -> bool {
        if left == 0 {
            let fill = self.greedy.fill(self.capacity - weight, forced);
            return value + fill >= self.target;
        }
        let n = forced.len();
        for i in start..=n.saturating_sub(left) {
            let w = self.greedy.units.weights[i];
            if weight + w > self.capacity {
                continue;
            }
            forced[i] = true;
            let hit = self.any_reaches(
                left - 1,
                i + 1,
                forced,
                weight + w,
                value + self.greedy.units.values[i],
            );
            forced[i] = false;
            if hit {
                return true;
            }
        }
        false
    }
}
