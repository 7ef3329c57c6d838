//! Constraint-satisfying instance search.
//!
//! Each attempt derives a seed, synthesizes items, picks one capacity per
//! budget and checks the instance-level constraints. The first attempt that
//! passes is returned. When every attempt fails, the latest near miss (an
//! attempt that found capacities but broke a constraint) is returned with a
//! warning. Without a near miss, the base seed is regenerated with midpoint
//! capacities and every constraint is relaxed.
//!
//! The search is a resumable [`SearchJob`]; [`run_search`] drives it in
//! chunks and polls a cancel flag between chunks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use knaplab_core::domain::{Item, Solution};
use knaplab_core::metrics::{assess, bundle_stats, sahni_k, Hardness, SahniK};
use knaplab_core::rng::Seed;
use knaplab_core::solver::{solve, DpTable, Units};

use crate::config::{midpoint, BudgetTarget, ConfigError, Constraints, SearchConfig};

/// Attempts processed between cancel checks.
pub const CHUNK_ATTEMPTS: usize = 64;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

// ─── Result types ────────────────────────────────────────────────────

/// The capacity chosen for one budget and everything measured there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetOutcome {
    pub capacity: u64,
    pub solution: Solution,
    pub hardness: Hardness,
}

/// Final result of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Base seed the search started from.
    pub seed_requested: Seed,
    /// Seed of the attempt that produced `items`.
    pub seed: Seed,
    pub items: Vec<Item>,
    /// One entry per configured budget, in order.
    pub budgets: Vec<BudgetOutcome>,
    pub attempts: usize,
    /// Set only when the fallback path was taken.
    pub warning: Option<String>,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        self.warning.is_none()
    }
}

/// Progress snapshot between chunks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchProgress {
    pub attempts: usize,
    pub max_attempts: usize,
    pub near_misses: usize,
    pub elapsed_secs: f64,
}

pub enum SearchStep {
    Pending(SearchProgress),
    Done(SearchOutcome),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("search cancelled after {attempts} attempts")]
    Cancelled { attempts: usize },
}

// ─── Attempt evaluation ──────────────────────────────────────────────

/// Why an attempt was abandoned.
#[derive(Debug)]
enum Rejection {
    EmptyWindow { budget: usize },
    NoCandidate { budget: usize },
    Constraints {
        failed: Vec<&'static str>,
        budgets: Vec<BudgetOutcome>,
    },
}

struct NearMiss {
    seed: Seed,
    items: Vec<Item>,
    budgets: Vec<BudgetOutcome>,
    failed: Vec<&'static str>,
}

/// Largest capacity strictly below the total weight.
fn capacity_ceiling(items: &[Item]) -> u64 {
    let units = Units::from_items(items);
    let total: u64 = units.weights.iter().sum();
    total.div_ceil(units.weight_scale).saturating_sub(1)
}

fn evaluate(config: &SearchConfig, items: &[Item]) -> Result<Vec<BudgetOutcome>, Rejection> {
    let upper = capacity_ceiling(items);
    let constraints = &config.constraints;
    let with_bundles = constraints.needs_bundles();

    let mut budgets = Vec::with_capacity(config.budgets.len());
    for (index, target) in config.budgets.iter().enumerate() {
        let lo = target.min.max(1);
        let hi = target.max.min(upper);
        if lo > hi {
            return Err(Rejection::EmptyWindow { budget: index });
        }
        let (capacity, solution) =
            pick_capacity(items, target, lo, hi).ok_or(Rejection::NoCandidate { budget: index })?;
        let hardness = assess(items, capacity, &solution, with_bundles, constraints.alpha_percent);
        budgets.push(BudgetOutcome {
            capacity,
            solution,
            hardness,
        });
    }

    let failed = failed_constraints(constraints, &budgets);
    if failed.is_empty() {
        Ok(budgets)
    } else {
        Err(Rejection::Constraints { failed, budgets })
    }
}

/// Choose a capacity in `[lo, hi]` whose optimum meets the budget's targets.
///
/// Without targets this is the window midpoint. Otherwise every capacity is
/// scanned against one shared DP table; a Sahni-k target takes the first
/// matching capacity, anything else takes the middle candidate.
fn pick_capacity(
    items: &[Item],
    target: &BudgetTarget,
    lo: u64,
    hi: u64,
) -> Option<(u64, Solution)> {
    if !target.has_optimum_targets() {
        let capacity = midpoint(lo, hi);
        return Some((capacity, solve(items, capacity)));
    }

    let table = DpTable::build(items, hi);
    let mut candidates = (lo..=hi).filter_map(|c| {
        let solution = table.solution_at(c)?;
        let in_range =
            target.opt_count.contains(solution.count) && target.opt_value.contains(solution.value);
        in_range.then_some((c, solution))
    });

    match target.sahni_k {
        Some(k) => candidates.find(|(c, s)| sahni_k(items, *c, s.value) == SahniK::Exact(k)),
        None => {
            let capacities: Vec<u64> = candidates.map(|(c, _)| c).collect();
            let c = *capacities.get(capacities.len() / 2)?;
            Some((c, table.solution_at(c)?))
        }
    }
}

fn failed_constraints(constraints: &Constraints, budgets: &[BudgetOutcome]) -> Vec<&'static str> {
    let mut failed = Vec::new();
    if let Some(ceiling) = constraints.greedy_ceiling {
        if budgets.iter().any(|b| b.hardness.greedy_ratio >= ceiling) {
            failed.push("greedy_ceiling");
        }
    }
    if let Some(ceiling) = constraints.n90_share_ceiling {
        let over = |b: &BudgetOutcome| b.hardness.bundles.map_or(true, |s| s.n90_share() > ceiling);
        if budgets.iter().any(over) {
            failed.push("n90_share_ceiling");
        }
    }
    if let Some(floor) = constraints.min_feasible {
        let under = |b: &BudgetOutcome| b.hardness.bundles.map_or(true, |s| s.feasible < floor);
        if budgets.iter().any(under) {
            failed.push("min_feasible");
        }
    }
    failed
}

/// Fill in bundle statistics the constraint checks did not need.
fn complete_bundles(items: &[Item], budgets: &mut [BudgetOutcome], alpha_percent: u32) {
    for b in budgets.iter_mut().filter(|b| b.hardness.bundles.is_none()) {
        b.hardness.bundles = bundle_stats(items, b.capacity, b.solution.value, alpha_percent);
    }
}

// ─── Resumable job ───────────────────────────────────────────────────

pub struct SearchJob<'a> {
    config: &'a SearchConfig,
    base_seed: Seed,
    max_attempts: usize,
    next_attempt: usize,
    near_misses: usize,
    near_miss: Option<NearMiss>,
    started: Instant,
}

impl<'a> SearchJob<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Self::with_seed(config, config.seed.clone())
    }

    /// Search from a base seed other than the config's (batch instances).
    pub fn with_seed(config: &'a SearchConfig, base_seed: Seed) -> Self {
        // A fixed item set is the same on every attempt.
        let max_attempts = if config.items.is_fixed() {
            1
        } else {
            config.max_attempts
        };
        Self {
            config,
            base_seed,
            max_attempts,
            next_attempt: 0,
            near_misses: 0,
            near_miss: None,
            started: Instant::now(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.next_attempt
    }

    pub fn progress(&self) -> SearchProgress {
        SearchProgress {
            attempts: self.next_attempt,
            max_attempts: self.max_attempts,
            near_misses: self.near_misses,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    /// Run up to `max_attempts` more attempts.
    ///
    /// Returns `Done` on the first satisfying attempt, or with the fallback
    /// result once the attempt budget is spent.
    pub fn step(&mut self, max_attempts: usize) -> SearchStep {
        let stop = self
            .next_attempt
            .saturating_add(max_attempts)
            .min(self.max_attempts);

        while self.next_attempt < stop {
            let attempt = self.next_attempt;
            self.next_attempt += 1;
            let seed = self.base_seed.for_attempt(attempt);
            let items = self.config.items.items_for(&seed);

            match evaluate(self.config, &items) {
                Ok(budgets) => return SearchStep::Done(self.finish(seed, items, budgets, None)),
                Err(Rejection::Constraints { failed, budgets }) => {
                    trace!(attempt, seed = %seed, ?failed, "attempt missed constraints");
                    debug!(
                        event = "near_miss",
                        attempt,
                        failed = %failed.join(","),
                        "near miss recorded"
                    );
                    self.near_misses += 1;
                    self.near_miss = Some(NearMiss {
                        seed,
                        items,
                        budgets,
                        failed,
                    });
                }
                Err(rejection) => {
                    trace!(attempt, seed = %seed, ?rejection, "attempt abandoned");
                }
            }
        }

        if self.next_attempt >= self.max_attempts {
            return SearchStep::Done(self.fallback());
        }
        SearchStep::Pending(self.progress())
    }

    fn finish(
        &self,
        seed: Seed,
        items: Vec<Item>,
        mut budgets: Vec<BudgetOutcome>,
        warning: Option<String>,
    ) -> SearchOutcome {
        complete_bundles(&items, &mut budgets, self.config.constraints.alpha_percent);
        SearchOutcome {
            seed_requested: self.base_seed.clone(),
            seed,
            items,
            budgets,
            attempts: self.next_attempt,
            warning,
        }
    }

    fn fallback(&mut self) -> SearchOutcome {
        let attempts = self.next_attempt;
        if let Some(miss) = self.near_miss.take() {
            let warning = format!(
                "no instance met every constraint in {attempts} attempts; relaxed: {}",
                miss.failed.join(", ")
            );
            warn!(seed = %miss.seed, %warning, "search fell back to near miss");
            return self.finish(miss.seed, miss.items, miss.budgets, Some(warning));
        }

        let seed = self.base_seed.clone();
        let items = self.config.items.items_for(&seed);
        let upper = capacity_ceiling(&items).max(1);
        let budgets = self
            .config
            .budgets
            .iter()
            .map(|target| {
                let capacity = target.midpoint().clamp(1, upper);
                let solution = solve(&items, capacity);
                let hardness = assess(
                    &items,
                    capacity,
                    &solution,
                    true,
                    self.config.constraints.alpha_percent,
                );
                BudgetOutcome {
                    capacity,
                    solution,
                    hardness,
                }
            })
            .collect();
        let warning = format!(
            "no attempt fit every budget window in {attempts} attempts; all constraints relaxed"
        );
        warn!(seed = %seed, %warning, "search fell back to base seed");
        self.finish(seed, items, budgets, Some(warning))
    }
}

// ─── Drivers ─────────────────────────────────────────────────────────

/// Run the search from the config's own seed.
///
/// # Arguments
/// - `progress_cb`: optional callback between chunks (throttled to ~500ms).
/// - `cancel`: optional flag polled between chunks; a started attempt
///   always completes.
pub fn run_search(
    config: &SearchConfig,
    progress_cb: Option<&dyn Fn(&SearchProgress)>,
    cancel: Option<&AtomicBool>,
) -> Result<SearchOutcome, SearchError> {
    run_search_with_seed(config, config.seed.clone(), progress_cb, cancel)
}

pub fn run_search_with_seed(
    config: &SearchConfig,
    seed: Seed,
    progress_cb: Option<&dyn Fn(&SearchProgress)>,
    cancel: Option<&AtomicBool>,
) -> Result<SearchOutcome, SearchError> {
    config.validate()?;
    info!(
        label = %config.label,
        seed = %seed,
        n_items = config.n_items(),
        budgets = config.budgets.len(),
        max_attempts = config.max_attempts,
        "search started"
    );

    let mut job = SearchJob::with_seed(config, seed);
    let mut last_progress = Instant::now();
    loop {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return Err(SearchError::Cancelled {
                attempts: job.attempts(),
            });
        }
        match job.step(CHUNK_ATTEMPTS) {
            SearchStep::Done(outcome) => {
                info!(
                    label = %config.label,
                    attempts = outcome.attempts,
                    found = outcome.found(),
                    "search finished"
                );
                return Ok(outcome);
            }
            SearchStep::Pending(progress) => {
                if let Some(cb) = progress_cb {
                    if last_progress.elapsed() >= PROGRESS_INTERVAL {
                        cb(&progress);
                        last_progress = Instant::now();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bounds, ItemSource};
    use knaplab_core::generator::ItemSpec;

    /// Seed "abc" yields weights [4, 1, 1, 9, 4] (total 19).
    fn abc_config(budget: BudgetTarget) -> SearchConfig {
        SearchConfig {
            label: "test".into(),
            seed: Seed::from("abc"),
            max_attempts: 20,
            items: ItemSource::Synthesize(ItemSpec::uniform_int(5, (1.0, 10.0), (1.0, 10.0))),
            budgets: vec![budget],
            constraints: Constraints::default(),
        }
    }

    fn done(step: SearchStep) -> SearchOutcome {
        match step {
            SearchStep::Done(outcome) => outcome,
            SearchStep::Pending(p) => panic!("still pending after {} attempts", p.attempts),
        }
    }

    #[test]
    fn capacity_ceiling_is_below_total_weight() {
        let items = ItemSpec::uniform_int(5, (1.0, 10.0), (1.0, 10.0)).generate(&Seed::from("abc"));
        assert_eq!(capacity_ceiling(&items), 18);
        let continuous = knaplab_core::domain::from_columns(&[1.25, 2.5], &[1.0, 1.0]);
        assert_eq!(capacity_ceiling(&continuous), 3);
    }

    #[test]
    fn unconstrained_budget_takes_window_midpoint() {
        let config = abc_config(BudgetTarget::range(10, 20));
        let outcome = done(SearchJob::new(&config).step(CHUNK_ATTEMPTS));
        assert!(outcome.found());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.seed, Seed::from("abc"));
        // window [10, 18]
        assert_eq!(outcome.budgets[0].capacity, 14);
        assert!(outcome.budgets[0].hardness.bundles.is_some());
    }

    #[test]
    fn count_filter_picks_matching_capacity() {
        let mut target = BudgetTarget::range(1, 18);
        target.opt_count = Bounds::new(Some(4), Some(4));
        let outcome = done(SearchJob::new(&abc_config(target)).step(CHUNK_ATTEMPTS));
        assert!(outcome.found());
        let b = &outcome.budgets[0];
        assert_eq!(b.solution.count, 4);
        assert!((1..=18).contains(&b.capacity));
    }

    #[test]
    fn sahni_target_takes_first_matching_capacity() {
        let mut target = BudgetTarget::range(1, 18);
        target.sahni_k = Some(0);
        let outcome = done(SearchJob::new(&abc_config(target)).step(CHUNK_ATTEMPTS));
        assert_eq!(outcome.budgets[0].capacity, 1);
        assert_eq!(outcome.budgets[0].solution.value, 9.0);
        assert_eq!(outcome.budgets[0].hardness.sahni_k, SahniK::Exact(0));
    }

    #[test]
    fn impossible_constraint_falls_back_to_latest_near_miss() {
        let mut config = abc_config(BudgetTarget::range(5, 10));
        config.constraints.greedy_ceiling = Some(0.0);
        let outcome = done(SearchJob::new(&config).step(CHUNK_ATTEMPTS));
        assert!(!outcome.found());
        assert_eq!(outcome.attempts, 20);
        assert_eq!(outcome.seed, Seed::from("abc_19"));
        assert_eq!(outcome.seed_requested, Seed::from("abc"));
        let warning = outcome.warning.unwrap();
        assert!(warning.contains("greedy_ceiling"), "{warning}");
    }

    #[test]
    fn empty_windows_fall_back_to_base_seed_midpoints() {
        let config = abc_config(BudgetTarget::range(100, 200));
        let outcome = done(SearchJob::new(&config).step(CHUNK_ATTEMPTS));
        assert_eq!(outcome.seed, Seed::from("abc"));
        // midpoint 150 clamped to total weight - 1
        assert_eq!(outcome.budgets[0].capacity, 18);
        assert!(outcome.warning.unwrap().contains("all constraints relaxed"));
    }

    #[test]
    fn step_is_resumable() {
        let mut config = abc_config(BudgetTarget::range(5, 10));
        config.constraints.greedy_ceiling = Some(0.0);
        let mut job = SearchJob::new(&config);
        match job.step(3) {
            SearchStep::Pending(p) => {
                assert_eq!(p.attempts, 3);
                assert_eq!(p.near_misses, 3);
                assert_eq!(p.max_attempts, 20);
            }
            SearchStep::Done(_) => panic!("finished early"),
        }
        let outcome = done(job.step(100));
        assert_eq!(outcome.attempts, 20);
    }

    #[test]
    fn fixed_items_run_a_single_attempt() {
        let items = ItemSpec::uniform_int(5, (1.0, 10.0), (1.0, 10.0)).generate(&Seed::from("abc"));
        let mut config = abc_config(BudgetTarget::range(5, 10));
        config.items = ItemSource::Fixed { fixed: items.clone() };
        config.constraints.greedy_ceiling = Some(0.0);
        let outcome = run_search(&config, None, None).unwrap();
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.items, items);
        assert!(!outcome.found());
    }

    #[test]
    fn cancel_flag_stops_before_work() {
        let config = abc_config(BudgetTarget::range(10, 20));
        let cancel = AtomicBool::new(true);
        let err = run_search(&config, None, Some(&cancel)).unwrap_err();
        assert!(matches!(err, SearchError::Cancelled { attempts: 0 }));
    }

    #[test]
    fn invalid_config_is_rejected_before_searching() {
        let config = abc_config(BudgetTarget::range(20, 10));
        let err = run_search(&config, None, None).unwrap_err();
        assert!(matches!(err, SearchError::Config(ConfigError::InvalidRange { .. })));
    }

    #[test]
    fn failed_constraints_are_named() {
        let items = ItemSpec::uniform_int(5, (1.0, 10.0), (1.0, 10.0)).generate(&Seed::from("abc"));
        let solution = solve(&items, 15);
        let hardness = assess(&items, 15, &solution, true, 90);
        let budgets = vec![BudgetOutcome {
            capacity: 15,
            solution,
            hardness,
        }];
        let constraints = Constraints {
            greedy_ceiling: Some(1.0),
            n90_share_ceiling: Some(0.05),
            min_feasible: Some(28),
            alpha_percent: 90,
        };
        // greedy 1.0 is not < 1.0; 2/27 > 0.05; 27 < 28
        assert_eq!(
            failed_constraints(&constraints, &budgets),
            vec!["greedy_ceiling", "n90_share_ceiling", "min_feasible"]
        );
        let relaxed = Constraints {
            greedy_ceiling: None,
            n90_share_ceiling: Some(0.08),
            min_feasible: Some(27),
            alpha_percent: 90,
        };
        assert!(failed_constraints(&relaxed, &budgets).is_empty());
    }
}
