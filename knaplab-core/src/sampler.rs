//! Distribution samplers for item weights and values.
//!
//! A [`Sampler`] is a distribution law crossed with a [`NumberKind`]:
//! - `Integer`: rounded to whole numbers, floored at 1
//! - `Continuous`: rounded to two decimals, floored at 0.01

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::domain::number::round2;
use crate::rng::UnitDraws;

/// Upper bound on rejection redraws before falling back to the floor value.
pub const MAX_REDRAWS: usize = 1_000;

/// Distribution law with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum Distribution {
    Uniform { min: f64, max: f64 },
    Normal { mean: f64, sd: f64 },
    #[serde(rename = "lognormal")]
    LogNormal { mu: f64, sigma: f64 },
}

impl Distribution {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Normal { .. } => "normal",
            Self::LogNormal { .. } => "lognormal",
        }
    }
}

/// Whether sampled numbers are whole or two-decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    #[default]
    Integer,
    Continuous,
}

impl NumberKind {
    /// Smallest admissible weight or value.
    pub fn min_positive(self) -> f64 {
        match self {
            Self::Integer => 1.0,
            Self::Continuous => 0.01,
        }
    }

    pub fn round(self, x: f64) -> f64 {
        match self {
            Self::Integer => x.round(),
            Self::Continuous => round2(x),
        }
    }

    /// Round, then clamp to the minimum positive value.
    pub fn finish(self, x: f64) -> f64 {
        let rounded = self.round(x);
        if rounded.is_finite() {
            rounded.max(self.min_positive())
        } else {
            self.min_positive()
        }
    }
}

/// A distribution law paired with its number kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampler {
    #[serde(flatten)]
    pub distribution: Distribution,
    #[serde(default)]
    pub kind: NumberKind,
}

impl Sampler {
    pub fn new(distribution: Distribution, kind: NumberKind) -> Self {
        Self { distribution, kind }
    }

    pub fn uniform_int(min: f64, max: f64) -> Self {
        Self::new(Distribution::Uniform { min, max }, NumberKind::Integer)
    }

    /// Draw one strictly positive sample.
    pub fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        match (self.distribution, self.kind) {
            (Distribution::Uniform { min, max }, NumberKind::Integer) => {
                let raw = (rng.next_f64() * (max - min + 1.0)).floor() + min;
                NumberKind::Integer.finish(raw)
            }
            (Distribution::Uniform { min, max }, NumberKind::Continuous) => {
                NumberKind::Continuous.finish(min + rng.next_f64() * (max - min))
            }
            (Distribution::Normal { mean, sd }, kind) => {
                for _ in 0..MAX_REDRAWS {
                    let raw = mean + sd * rng.standard_normal();
                    if raw > 0.0 {
                        return kind.finish(raw);
                    }
                }
                kind.min_positive()
            }
            (Distribution::LogNormal { mu, sigma }, NumberKind::Integer) => {
                for _ in 0..MAX_REDRAWS {
                    let v = (mu + sigma * rng.standard_normal()).exp().round();
                    if v >= 1.0 && v.is_finite() {
                        return v;
                    }
                }
                NumberKind::Integer.min_positive()
            }
            (Distribution::LogNormal { mu, sigma }, NumberKind::Continuous) => {
                NumberKind::Continuous.finish((mu + sigma * rng.standard_normal()).exp())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Seed, SeededRng};
    use rand::rngs::mock::StepRng;

    fn rng(seed: &str) -> SeededRng {
        SeededRng::from_seed(&Seed::from(seed))
    }

    #[test]
    fn samples_from_any_rand_generator() {
        // An all-zero word stream hits the low end of the uniform range.
        let mut zeros = StepRng::new(0, 0);
        assert_eq!(Sampler::uniform_int(3.0, 7.0).sample(&mut zeros), 3.0);
    }

    #[test]
    fn uniform_integer_stays_in_range() {
        let s = Sampler::uniform_int(3.0, 7.0);
        let mut r = rng("uniform");
        for _ in 0..2_000 {
            let v = s.sample(&mut r);
            assert!((3.0..=7.0).contains(&v));
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn uniform_integer_hits_both_ends() {
        let s = Sampler::uniform_int(1.0, 3.0);
        let mut r = rng("ends");
        let draws: Vec<f64> = (0..500).map(|_| s.sample(&mut r)).collect();
        assert!(draws.contains(&1.0));
        assert!(draws.contains(&3.0));
    }

    #[test]
    fn continuous_values_have_two_decimals() {
        let s = Sampler::new(
            Distribution::Uniform { min: 0.0, max: 5.0 },
            NumberKind::Continuous,
        );
        let mut r = rng("cont");
        for _ in 0..1_000 {
            let v = s.sample(&mut r);
            assert!(v >= 0.01);
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-6);
        }
    }

    #[test]
    fn normal_is_rejected_until_positive() {
        let s = Sampler::new(Distribution::Normal { mean: 1.0, sd: 5.0 }, NumberKind::Integer);
        let mut r = rng("normal");
        for _ in 0..1_000 {
            assert!(s.sample(&mut r) >= 1.0);
        }
    }

    #[test]
    fn hopeless_normal_falls_back_to_floor() {
        let s = Sampler::new(
            Distribution::Normal { mean: -1_000.0, sd: 1.0 },
            NumberKind::Continuous,
        );
        assert_eq!(s.sample(&mut rng("neg")), 0.01);
    }

    #[test]
    fn lognormal_continuous_is_clamped() {
        let s = Sampler::new(
            Distribution::LogNormal { mu: -20.0, sigma: 0.1 },
            NumberKind::Continuous,
        );
        assert_eq!(s.sample(&mut rng("tiny")), 0.01);
    }

    #[test]
    fn lognormal_integer_is_at_least_one() {
        let s = Sampler::new(
            Distribution::LogNormal { mu: 0.0, sigma: 1.0 },
            NumberKind::Integer,
        );
        let mut r = rng("logn");
        for _ in 0..1_000 {
            assert!(s.sample(&mut r) >= 1.0);
        }
    }

    #[test]
    fn deserializes_flattened_toml_shape() {
        let s: Sampler =
            serde_json::from_str(r#"{"distribution":"lognormal","mu":2,"sigma":0.5}"#).unwrap();
        assert_eq!(s.kind, NumberKind::Integer);
        assert_eq!(s.distribution, Distribution::LogNormal { mu: 2.0, sigma: 0.5 });
    }
}
