//! Deterministic seeded random stream.
//!
//! A [`Seed`] (free text or an integer) is reduced to a 32-bit state. The
//! stream generator is mulberry32: the state is advanced by a fixed odd
//! increment on every call and mixed into the output word, so the same seed
//! yields the same sequence on every platform. Not cryptographically secure.
//!
//! Per-attempt and per-instance seeds are derived by string suffixing, which
//! makes every derived seed printable and replayable on its own.

use std::f64::consts::PI;
use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Seed for a generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(i64),
    Text(String),
}

impl Seed {
    /// Numeric seeds coming from floating-point hosts are truncated toward zero.
    pub fn from_f64(value: f64) -> Self {
        Seed::Number(value.trunc() as i64)
    }

    /// Reduce the seed to the 32-bit generator state.
    pub fn state(&self) -> u32 {
        match self {
            Seed::Number(n) => *n as u32,
            Seed::Text(s) => hash_text(s),
        }
    }

    /// Seed for the given retry attempt: attempt 0 is the seed itself,
    /// later attempts append `_<attempt>`.
    pub fn for_attempt(&self, attempt: usize) -> Seed {
        if attempt == 0 {
            self.clone()
        } else {
            Seed::Text(format!("{self}_{attempt}"))
        }
    }

    /// Base seed for instance `index` of a batch: instance 0 keeps the seed,
    /// later instances append `#<index + 1>`.
    pub fn for_instance(&self, index: usize) -> Seed {
        if index == 0 {
            self.clone()
        } else {
            Seed::Text(format!("{self}#{}", index + 1))
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Number(n) => write!(f, "{n}"),
            Seed::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

impl From<i64> for Seed {
    fn from(n: i64) -> Self {
        Seed::Number(n)
    }
}

/// Polynomial rolling hash (`h = 31·h + unit`) over UTF-16 code units with
/// signed 32-bit wrap-around; the absolute value is returned.
pub fn hash_text(text: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
    }
    hash.unsigned_abs()
}

/// mulberry32 stream generator.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(state: u32) -> Self {
        Self { state }
    }

    pub fn from_seed(seed: &Seed) -> Self {
        Self::new(seed.state())
    }

    fn next_word(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let a = self.state;
        let mut t = (a ^ (a >> 15)).wrapping_mul(1 | a);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_word() as u64;
        let lo = self.next_word() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Unit-interval and normal draws over any 32-bit word stream.
///
/// Implemented for every `RngCore`; samplers draw through this trait.
pub trait UnitDraws: RngCore {
    /// Uniform draw in [0, 1) from one 32-bit word.
    fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / TWO_POW_32
    }

    /// Standard normal draw via Box-Muller, cosine branch only.
    ///
    /// Consumes two uniform draws per value; the sine partner is discarded.
    fn standard_normal(&mut self) -> f64 {
        let mut u1 = self.next_f64();
        let u2 = self.next_f64();
        if u1 == 0.0 {
            u1 = f64::MIN_POSITIVE;
        }
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

impl<R: RngCore + ?Sized> UnitDraws for R {}
