//! knaplab core: the knapsack instance-hardness engine.
//!
//! - Seeded, platform-stable random stream (mulberry32)
//! - Distribution samplers and the item synthesizer
//! - Exact bounded-capacity DP solver
//! - Hardness metrics: Sahni-k, greedy ratio, bundle statistics
//!
//! Everything here is a pure function of its inputs. Orchestration (search,
//! batch, reports) lives in `knaplab-runner`.

pub mod domain;
pub mod generator;
pub mod metrics;
pub mod rng;
pub mod sampler;
pub mod solver;

pub use domain::{Item, ItemId, Solution};
pub use generator::{Correlation, ItemSpec, RatioSpread, SpecError};
pub use metrics::{Hardness, SahniK};
pub use rng::{Seed, SeededRng, UnitDraws};
pub use sampler::{Distribution, NumberKind, Sampler};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: values handed to worker threads are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Item>();
        require_sync::<Item>();
        require_send::<Solution>();
        require_sync::<Solution>();
        require_send::<ItemSpec>();
        require_sync::<ItemSpec>();
        require_send::<Seed>();
        require_sync::<Seed>();
        require_send::<Hardness>();
        require_sync::<Hardness>();
        require_send::<SeededRng>();
        require_sync::<SeededRng>();
    }
}
