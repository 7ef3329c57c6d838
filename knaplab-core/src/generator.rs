//! Item synthesizer.
//!
//! One generation attempt, in a fixed order that determines how the random
//! stream is consumed:
//! 1. `n` weights from the weight sampler
//! 2. `n` values (independent draws, or correlated with the weights)
//! 3. ratio spread around the mean value/weight ratio
//! 4. integer-ratio snapping
//!
//! Reordering any of these steps changes the instance produced for a seed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::number::round2;
use crate::domain::{from_columns, Item};
use crate::rng::{Seed, SeededRng, UnitDraws};
use crate::sampler::{Distribution, NumberKind, Sampler};

/// Rule linking an item's value to its weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Correlation {
    #[default]
    Independent,
    /// `value = alpha·weight + noise`
    Positive { alpha: f64, noise_sd: f64 },
    /// `value = alpha·(max_weight − weight) + noise`
    Negative { alpha: f64, noise_sd: f64 },
}

/// How far value/weight ratios are pushed from their mean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioSpread {
    /// Compress toward the mean; greedy is harder to beat.
    Low,
    #[default]
    Medium,
    /// Stretch away from the mean; greedy does well.
    High,
}

impl RatioSpread {
    pub fn lambda(self) -> f64 {
        match self {
            Self::Low => 0.3,
            Self::Medium => 1.0,
            Self::High => 2.0,
        }
    }
}

/// Everything needed to synthesize one item set from a seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub n_items: usize,
    pub weights: Sampler,
    pub values: Sampler,
    #[serde(default)]
    pub correlation: Correlation,
    #[serde(default)]
    pub ratio_spread: RatioSpread,
    #[serde(default)]
    pub integer_ratios: bool,
}

/// Structural problems in an [`ItemSpec`].
#[derive(Debug, Error, PartialEq)]
pub enum SpecError {
    #[error("item count must be positive")]
    ZeroItems,
    #[error("{field}: min ({min}) is greater than max ({max})")]
    InvalidRange {
        field: String,
        min: f64,
        max: f64,
    },
    #[error("{field}: must be non-negative, got {value}")]
    Negative { field: String, value: f64 },
    #[error("{field}: must be finite")]
    NotFinite { field: String },
}

impl ItemSpec {
    /// Uniform integer weights and values, independent, no post-processing.
    pub fn uniform_int(n_items: usize, weights: (f64, f64), values: (f64, f64)) -> Self {
        Self {
            n_items,
            weights: Sampler::uniform_int(weights.0, weights.1),
            values: Sampler::uniform_int(values.0, values.1),
            correlation: Correlation::Independent,
            ratio_spread: RatioSpread::Medium,
            integer_ratios: false,
        }
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.n_items == 0 {
            return Err(SpecError::ZeroItems);
        }
        validate_sampler("weights", &self.weights)?;
        validate_sampler("values", &self.values)?;
        if let Correlation::Positive { alpha, noise_sd } | Correlation::Negative { alpha, noise_sd } =
            self.correlation
        {
            finite("correlation.alpha", alpha)?;
            non_negative("correlation.noise_sd", noise_sd)?;
        }
        Ok(())
    }

    /// Synthesize the item set for one seed.
    pub fn generate(&self, seed: &Seed) -> Vec<Item> {
        let mut rng = SeededRng::from_seed(seed);

        let weights: Vec<f64> = (0..self.n_items)
            .map(|_| self.weights.sample(&mut rng))
            .collect();
        let max_weight = weights.iter().copied().fold(0.0, f64::max);

        let kind = self.values.kind;
        let mut values: Vec<f64> = match self.correlation {
            Correlation::Independent => (0..self.n_items)
                .map(|_| self.values.sample(&mut rng))
                .collect(),
            Correlation::Positive { alpha, noise_sd } => weights
                .iter()
                .map(|&w| kind.finish(alpha * w + noise_sd * rng.standard_normal()))
                .collect(),
            Correlation::Negative { alpha, noise_sd } => weights
                .iter()
                .map(|&w| kind.finish(alpha * (max_weight - w) + noise_sd * rng.standard_normal()))
                .collect(),
        };

        apply_ratio_spread(&weights, &mut values, self.ratio_spread, kind);
        if self.integer_ratios {
            snap_integer_ratios(&weights, &mut values);
        }

        from_columns(&weights, &values)
    }
}

/// Replace each ratio `r` with `mean + λ(r − mean)`, using the pre-spread mean.
fn apply_ratio_spread(weights: &[f64], values: &mut [f64], spread: RatioSpread, kind: NumberKind) {
    let lambda = spread.lambda();
    if lambda == 1.0 || values.is_empty() {
        return;
    }
    let ratios: Vec<f64> = values.iter().zip(weights).map(|(v, w)| v / w).collect();
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    for ((value, &w), &r) in values.iter_mut().zip(weights).zip(&ratios) {
        let spread_ratio = mean + lambda * (r - mean);
        *value = kind.finish(spread_ratio * w);
    }
}

/// Force every value to a whole multiple (at least 1) of its weight.
fn snap_integer_ratios(weights: &[f64], values: &mut [f64]) {
    for (value, &w) in values.iter_mut().zip(weights) {
        let multiple = (*value / w).round().max(1.0);
        *value = round2(multiple * w);
    }
}

fn validate_sampler(field: &str, sampler: &Sampler) -> Result<(), SpecError> {
    match sampler.distribution {
        Distribution::Uniform { min, max } => {
            finite(&format!("{field}.min"), min)?;
            finite(&format!("{field}.max"), max)?;
            if min > max {
                return Err(SpecError::InvalidRange {
                    field: field.to_string(),
                    min,
                    max,
                });
            }
        }
        Distribution::Normal { mean, sd } => {
            finite(&format!("{field}.mean"), mean)?;
            non_negative(&format!("{field}.sd"), sd)?;
        }
        Distribution::LogNormal { mu, sigma } => {
            finite(&format!("{field}.mu"), mu)?;
            non_negative(&format!("{field}.sigma"), sigma)?;
        }
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), SpecError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SpecError::NotFinite {
            field: field.to_string(),
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), SpecError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(SpecError::Negative {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
