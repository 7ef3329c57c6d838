//! Serializable search configuration.
//!
//! A [`SearchConfig`] is loaded from TOML, validated once, and then passed by
//! reference into the search. Two configs with the same content share a
//! [`SearchConfig::config_hash`], which is reported with every instance.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use knaplab_core::domain::Item;
use knaplab_core::generator::{ItemSpec, SpecError};
use knaplab_core::metrics::{DEFAULT_ALPHA_PERCENT, MAX_BUNDLE_ITEMS, SAHNI_K_CAP};
use knaplab_core::rng::Seed;

pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

/// Content-addressed id of a configuration (BLAKE3 hex digest).
pub type ConfigHash = String;

/// Complete description of one constrained generation problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_label")]
    pub label: String,
    pub seed: Seed,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    pub items: ItemSource,
    pub budgets: Vec<BudgetTarget>,
    #[serde(default)]
    pub constraints: Constraints,
}

fn default_label() -> String {
    "knapsack".to_string()
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

/// Where the items of an attempt come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemSource {
    /// A user-supplied item set. Only the capacities are searched.
    Fixed { fixed: Vec<Item> },
    /// Items synthesized from the attempt seed.
    Synthesize(ItemSpec),
}

impl ItemSource {
    pub fn n_items(&self) -> usize {
        match self {
            Self::Fixed { fixed } => fixed.len(),
            Self::Synthesize(spec) => spec.n_items,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed { .. })
    }

    /// The item set for one attempt seed.
    pub fn items_for(&self, seed: &Seed) -> Vec<Item> {
        match self {
            Self::Fixed { fixed } => fixed.clone(),
            Self::Synthesize(spec) => spec.generate(seed),
        }
    }
}

/// Inclusive bounds where either side may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    #[serde(default)]
    pub min: Option<T>,
    #[serde(default)]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// Open on both sides: the filter is disabled.
    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, x: T) -> bool {
        self.min.map_or(true, |lo| x >= lo) && self.max.map_or(true, |hi| x <= hi)
    }

    fn inverted(&self) -> Option<(T, T)> {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) if lo > hi => Some((lo, hi)),
            _ => None,
        }
    }
}

/// One knapsack capacity to find, with the targets its optimum must meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetTarget {
    pub min: u64,
    pub max: u64,
    #[serde(default)]
    pub opt_count: Bounds<usize>,
    #[serde(default)]
    pub opt_value: Bounds<f64>,
    /// Required Sahni-k of the optimum; `None` disables the filter.
    #[serde(default)]
    pub sahni_k: Option<u8>,
}

impl BudgetTarget {
    pub fn range(min: u64, max: u64) -> Self {
        Self {
            min,
            max,
            opt_count: Bounds::default(),
            opt_value: Bounds::default(),
            sahni_k: None,
        }
    }

    /// Whether choosing a capacity needs a scan over the window.
    pub fn has_optimum_targets(&self) -> bool {
        !self.opt_count.is_open() || !self.opt_value.is_open() || self.sahni_k.is_some()
    }

    pub fn midpoint(&self) -> u64 {
        midpoint(self.min, self.max)
    }
}

/// `(lo + hi) / 2` without overflow.
pub(crate) fn midpoint(lo: u64, hi: u64) -> u64 {
    lo / 2 + hi / 2 + (lo % 2 + hi % 2) / 2
}

/// Instance-level hardness constraints, checked at every budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Greedy ratio must be strictly below this.
    #[serde(default)]
    pub greedy_ceiling: Option<f64>,
    /// `n90 / feasible` must be at or below this.
    #[serde(default)]
    pub n90_share_ceiling: Option<f64>,
    #[serde(default)]
    pub min_feasible: Option<u64>,
    #[serde(default = "default_alpha_percent")]
    pub alpha_percent: u32,
}

fn default_alpha_percent() -> u32 {
    DEFAULT_ALPHA_PERCENT
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            greedy_ceiling: None,
            n90_share_ceiling: None,
            min_feasible: None,
            alpha_percent: DEFAULT_ALPHA_PERCENT,
        }
    }
}

impl Constraints {
    /// Bundle statistics are required to check these constraints.
    pub fn needs_bundles(&self) -> bool {
        self.n90_share_ceiling.is_some() || self.min_feasible.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("at least one budget is required")]
    NoBudgets,
    #[error("max_attempts must be positive")]
    ZeroAttempts,
    #[error("{field}: min ({min}) is greater than max ({max})")]
    InvalidRange {
        field: String,
        min: f64,
        max: f64,
    },
    #[error("{field}: {value} is outside [0, 1]")]
    CeilingOutOfRange { field: &'static str, value: f64 },
    #[error("alpha_percent must be within 1..=100, got {0}")]
    AlphaPercent(u32),
    #[error("budgets[{index}].sahni_k: {value} exceeds {}", SAHNI_K_CAP)]
    SahniTarget { index: usize, value: u8 },
    #[error("bundle constraints need at most {} items, got {n_items}", MAX_BUNDLE_ITEMS)]
    TooManyItemsForBundles { n_items: usize },
    #[error("fixed item {id} must have a positive weight and value")]
    NonPositiveItem { id: u32 },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SearchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn n_items(&self) -> usize {
        self.items.n_items()
    }

    /// Check every structural rule. Nothing is generated before this passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        match &self.items {
            ItemSource::Synthesize(spec) => spec.validate()?,
            ItemSource::Fixed { fixed } => {
                if fixed.is_empty() {
                    return Err(SpecError::ZeroItems.into());
                }
                if let Some(bad) = fixed.iter().find(|i| !(i.weight > 0.0 && i.value > 0.0)) {
                    return Err(ConfigError::NonPositiveItem { id: bad.id });
                }
            }
        }

        if self.budgets.is_empty() {
            return Err(ConfigError::NoBudgets);
        }
        for (index, budget) in self.budgets.iter().enumerate() {
            if budget.min > budget.max {
                return Err(ConfigError::InvalidRange {
                    field: format!("budgets[{index}]"),
                    min: budget.min as f64,
                    max: budget.max as f64,
                });
            }
            if let Some((min, max)) = budget.opt_count.inverted() {
                return Err(ConfigError::InvalidRange {
                    field: format!("budgets[{index}].opt_count"),
                    min: min as f64,
                    max: max as f64,
                });
            }
            if let Some((min, max)) = budget.opt_value.inverted() {
                return Err(ConfigError::InvalidRange {
                    field: format!("budgets[{index}].opt_value"),
                    min,
                    max,
                });
            }
            if let Some(value) = budget.sahni_k.filter(|&k| k > SAHNI_K_CAP) {
                return Err(ConfigError::SahniTarget { index, value });
            }
        }

        let c = &self.constraints;
        for (field, ceiling) in [
            ("constraints.greedy_ceiling", c.greedy_ceiling),
            ("constraints.n90_share_ceiling", c.n90_share_ceiling),
        ] {
            if let Some(value) = ceiling.filter(|v| !(0.0..=1.0).contains(v)) {
                return Err(ConfigError::CeilingOutOfRange { field, value });
            }
        }
        if !(1..=100).contains(&c.alpha_percent) {
            return Err(ConfigError::AlphaPercent(c.alpha_percent));
        }
        if c.needs_bundles() && self.n_items() > MAX_BUNDLE_ITEMS {
            return Err(ConfigError::TooManyItemsForBundles {
                n_items: self.n_items(),
            });
        }
        Ok(())
    }

    /// Deterministic hash of the config content.
    ///
    /// Field order is fixed by the struct definitions, so the JSON encoding
    /// is canonical.
    pub fn config_hash(&self) -> ConfigHash {
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}
