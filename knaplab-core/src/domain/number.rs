//! Serialization for mixed integer / two-decimal quantities.
//!
//! Weights and values are stored as `f64` but are integral whenever the
//! integer flag was set. Integral numbers serialize as JSON integers so that
//! exported instances read `{"weight": 4}` rather than `{"weight": 4.0}`.

use serde::Serializer;

/// Largest magnitude written as an integer; beyond it `f64` loses exactness.
const EXACT_INT_LIMIT: f64 = 9_007_199_254_740_992.0;

pub fn is_integral(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0 && x.abs() < EXACT_INT_LIMIT
}

/// Round to two decimal places, halves away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if is_integral(*value) {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Plain-text rendering with the same integer/decimal rule as JSON.
pub fn format(value: f64) -> String {
    if is_integral(value) {
        format!("{}", value as i64)
    } else {
        format!("{}", round2(value))
    }
}
