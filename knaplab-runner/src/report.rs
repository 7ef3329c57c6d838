//! Instance report: the published form of a search outcome.
//!
//! The JSON shape depends on the number of budgets:
//! - one budget: `budget`, `optimal`
//! - two budgets: `budget_low`/`budget_high`, `optimal_low`/`optimal_high`
//! - three or more: `budgets`, `optimals` arrays

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use knaplab_core::domain::{number, Item, ItemId};
use knaplab_core::metrics::SahniK;
use knaplab_core::rng::Seed;

use crate::config::{ConfigHash, SearchConfig};
use crate::search::{BudgetOutcome, SearchOutcome};

/// Optimum summary at one capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalReport {
    pub count: usize,
    #[serde(serialize_with = "number::serialize")]
    pub value: f64,
    #[serde(serialize_with = "number::serialize")]
    pub weight: f64,
    pub sahni_k: SahniK,
    pub greedy_ratio: f64,
    pub item_ids: Vec<ItemId>,
}

impl OptimalReport {
    fn from_outcome(b: &BudgetOutcome) -> Self {
        Self {
            count: b.solution.count,
            value: b.solution.value,
            weight: b.solution.weight,
            sahni_k: b.hardness.sahni_k,
            greedy_ratio: b.hardness.greedy_ratio,
            item_ids: b.solution.item_ids(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceReport {
    pub problem: String,
    pub seed: Seed,
    pub seed_requested: Seed,
    pub budgets: Vec<u64>,
    pub optimals: Vec<OptimalReport>,
    /// Bundle counts at the first budget; `None` above the bundle limit.
    pub n90: Option<u64>,
    pub feasible_count: Option<u64>,
    pub items: Vec<Item>,
    pub config_hash: ConfigHash,
    pub attempts: usize,
    pub warning: Option<String>,
}

impl InstanceReport {
    pub fn new(config: &SearchConfig, outcome: &SearchOutcome) -> Self {
        Self::labelled(config.label.clone(), config, outcome)
    }

    pub fn labelled(problem: String, config: &SearchConfig, outcome: &SearchOutcome) -> Self {
        let first = outcome.budgets.first().and_then(|b| b.hardness.bundles);
        Self {
            problem,
            seed: outcome.seed.clone(),
            seed_requested: outcome.seed_requested.clone(),
            budgets: outcome.budgets.iter().map(|b| b.capacity).collect(),
            optimals: outcome.budgets.iter().map(OptimalReport::from_outcome).collect(),
            n90: first.map(|s| s.n90),
            feasible_count: first.map(|s| s.feasible),
            items: outcome.items.clone(),
            config_hash: config.config_hash(),
            attempts: outcome.attempts,
            warning: outcome.warning.clone(),
        }
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Greedy ratio at the first budget.
    pub fn greedy_ratio(&self) -> f64 {
        self.optimals.first().map_or(0.0, |o| o.greedy_ratio)
    }

    /// Report keys for each budget, in order.
    pub fn budget_keys(&self) -> Vec<String> {
        match self.budgets.len() {
            1 => vec![String::new()],
            2 => vec!["_low".to_string(), "_high".to_string()],
            n => (0..n).map(|i| format!("[{i}]")).collect(),
        }
    }
}

impl Serialize for InstanceReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("problem", &self.problem)?;
        map.serialize_entry("n_items", &self.n_items())?;
        map.serialize_entry("seed", &self.seed)?;
        map.serialize_entry("seed_requested", &self.seed_requested)?;

        match (self.budgets.as_slice(), self.optimals.as_slice()) {
            ([budget], [optimal]) => {
                map.serialize_entry("budget", budget)?;
                map.serialize_entry("optimal", optimal)?;
            }
            ([low, high], [opt_low, opt_high]) => {
                map.serialize_entry("budget_low", low)?;
                map.serialize_entry("budget_high", high)?;
                map.serialize_entry("optimal_low", opt_low)?;
                map.serialize_entry("optimal_high", opt_high)?;
            }
            (budgets, optimals) => {
                map.serialize_entry("budgets", budgets)?;
                map.serialize_entry("optimals", optimals)?;
            }
        }

        map.serialize_entry("greedy_ratio", &self.greedy_ratio())?;
        map.serialize_entry("n90", &self.n90)?;
        map.serialize_entry("feasible_count", &self.feasible_count)?;
        map.serialize_entry("items", &self.items)?;
        map.serialize_entry("config_hash", &self.config_hash)?;
        map.serialize_entry("attempts", &self.attempts)?;
        if let Some(warning) = &self.warning {
            map.serialize_entry("warning", warning)?;
        }
        map.end()
    }
}
