//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Solver optimality: DP value equals brute force for small item sets
//! 2. Feasibility: solution weight never exceeds capacity
//! 3. Determinism: same seed, same items
//! 4. Positivity: every generated weight and value clears its floor
//! 5. Metric bounds: greedy ratio in [0,1], n90 ≤ feasible ≤ 2^n − 1

use proptest::prelude::*;
use knaplab_core::domain::{from_columns, Item};
use knaplab_core::generator::{Correlation, ItemSpec, RatioSpread};
use knaplab_core::metrics::{bundle_stats, greedy_ratio, sahni_k, SahniK};
use knaplab_core::rng::Seed;
use knaplab_core::sampler::{Distribution, NumberKind, Sampler};
use knaplab_core::solver::{solve, DpTable};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_items(max_n: usize) -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec((1u32..30, 1u32..30), 0..=max_n).prop_map(|pairs| {
        let weights: Vec<f64> = pairs.iter().map(|p| p.0 as f64).collect();
        let values: Vec<f64> = pairs.iter().map(|p| p.1 as f64).collect();
        from_columns(&weights, &values)
    })
}

fn arb_sampler() -> impl Strategy<Value = Sampler> {
    let kind = prop_oneof![Just(NumberKind::Integer), Just(NumberKind::Continuous)];
    let dist = prop_oneof![
        (1.0..50.0_f64, 0.0..50.0_f64).prop_map(|(min, span)| Distribution::Uniform {
            min,
            max: min + span
        }),
        (-10.0..40.0_f64, 0.0..15.0_f64).prop_map(|(mean, sd)| Distribution::Normal { mean, sd }),
        (0.0..3.0_f64, 0.0..1.5_f64).prop_map(|(mu, sigma)| Distribution::LogNormal { mu, sigma }),
    ];
    (dist, kind).prop_map(|(d, k)| Sampler::new(d, k))
}

fn arb_spec() -> impl Strategy<Value = ItemSpec> {
    let correlation = prop_oneof![
        Just(Correlation::Independent),
        (0.1..3.0_f64, 0.0..5.0_f64)
            .prop_map(|(alpha, noise_sd)| Correlation::Positive { alpha, noise_sd }),
        (0.1..3.0_f64, 0.0..5.0_f64)
            .prop_map(|(alpha, noise_sd)| Correlation::Negative { alpha, noise_sd }),
    ];
    let spread = prop_oneof![
        Just(RatioSpread::Low),
        Just(RatioSpread::Medium),
        Just(RatioSpread::High)
    ];
    (1usize..25, arb_sampler(), arb_sampler(), correlation, spread, any::<bool>()).prop_map(
        |(n_items, weights, values, correlation, ratio_spread, integer_ratios)| ItemSpec {
            n_items,
            weights,
            values,
            correlation,
            ratio_spread,
            integer_ratios,
        },
    )
}

fn brute_force(items: &[Item], capacity: u64) -> f64 {
    let n = items.len();
    let mut best = 0.0;
    for mask in 0u32..(1 << n) {
        let (w, v) = (0..n)
            .filter(|i| mask & (1 << i) != 0)
            .fold((0.0, 0.0), |(w, v), i| (w + items[i].weight, v + items[i].value));
        if w <= capacity as f64 && v > best {
            best = v;
        }
    }
    best
}

/// Forced subset `mask` plus the ratio-greedy fill of what is left, or
/// `None` when the forced items alone overflow `capacity`. Integer items only.
fn forced_then_greedy(items: &[Item], capacity: u64, mask: u32) -> Option<u64> {
    let weight = |i: usize| items[i].weight as u64;
    let value = |i: usize| items[i].value as u64;
    let forced: Vec<usize> = (0..items.len()).filter(|i| mask & (1 << i) != 0).collect();
    let forced_weight: u64 = forced.iter().map(|&i| weight(i)).sum();
    let mut remaining = capacity.checked_sub(forced_weight)?;

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| (value(b) * weight(a)).cmp(&(value(a) * weight(b))));
    let mut total: u64 = forced.iter().map(|&i| value(i)).sum();
    for i in order.into_iter().filter(|i| mask & (1 << i) == 0) {
        if weight(i) <= remaining {
            remaining -= weight(i);
            total += value(i);
        }
    }
    Some(total)
}

/// Best forced-then-greedy value over forced subsets of each size `0..=n`.
fn best_by_forced_size(items: &[Item], capacity: u64) -> Vec<Option<u64>> {
    let n = items.len();
    let mut best = vec![None; n + 1];
    for mask in 0u32..(1 << n) {
        if let Some(v) = forced_then_greedy(items, capacity, mask) {
            let slot = &mut best[mask.count_ones() as usize];
            *slot = Some(slot.map_or(v, |b: u64| b.max(v)));
        }
    }
    best
}

// ── 1-2. Solver ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn dp_matches_brute_force(items in arb_items(12), capacity in 0u64..120) {
        let s = solve(&items, capacity);
        prop_assert_eq!(s.value, brute_force(&items, capacity));
        prop_assert!(s.weight <= capacity as f64);
        prop_assert_eq!(s.count, s.items.len());
    }

    #[test]
    fn solution_keeps_original_order(items in arb_items(15), capacity in 0u64..150) {
        let ids = solve(&items, capacity).item_ids();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn solve_is_idempotent(items in arb_items(15), capacity in 0u64..150) {
        prop_assert_eq!(solve(&items, capacity), solve(&items, capacity));
    }

    #[test]
    fn shared_table_agrees_with_fresh_solve(items in arb_items(10), capacity in 0u64..80) {
        let table = DpTable::build(&items, 80);
        prop_assert_eq!(table.solution_at(capacity), Some(solve(&items, capacity)));
    }
}

// ── 3-4. Generation ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn generation_is_deterministic(spec in arb_spec(), seed in "[a-z0-9]{0,12}") {
        let seed = Seed::from(seed);
        prop_assert_eq!(spec.generate(&seed), spec.generate(&seed));
    }

    #[test]
    fn generated_items_are_positive(spec in arb_spec(), seed in any::<i64>()) {
        let items = spec.generate(&Seed::Number(seed));
        prop_assert_eq!(items.len(), spec.n_items);
        for (i, item) in items.iter().enumerate() {
            prop_assert_eq!(item.id as usize, i + 1);
            prop_assert!(item.weight >= spec.weights.kind.min_positive());
            prop_assert!(item.value >= 0.01);
            if spec.weights.kind == NumberKind::Integer {
                prop_assert_eq!(item.weight.fract(), 0.0);
            }
        }
    }

    #[test]
    fn integer_ratios_are_whole_multiples(seed in "[a-z]{1,8}", n in 1usize..20) {
        let spec = ItemSpec {
            integer_ratios: true,
            ..ItemSpec::uniform_int(n, (1.0, 20.0), (1.0, 60.0))
        };
        for item in spec.generate(&Seed::from(seed)) {
            prop_assert_eq!(item.value % item.weight, 0.0);
            prop_assert!(item.value / item.weight >= 1.0);
        }
    }
}

// ── 5. Metrics ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn greedy_ratio_is_bounded(items in arb_items(14), capacity in 0u64..120) {
        let opt = solve(&items, capacity).value;
        let r = greedy_ratio(&items, capacity, opt);
        prop_assert!((0.0..=1.0).contains(&r));
        if opt == 0.0 {
            prop_assert_eq!(r, 0.0);
        }
    }

    #[test]
    fn sahni_zero_iff_greedy_optimal(items in arb_items(10), capacity in 1u64..100) {
        let opt = solve(&items, capacity).value;
        let k = sahni_k(&items, capacity, opt);
        let greedy_hits = opt == 0.0 || greedy_ratio(&items, capacity, opt) == 1.0;
        prop_assert_eq!(k == SahniK::Exact(0), greedy_hits);
    }

    #[test]
    fn bundle_counts_are_ordered(items in arb_items(12), capacity in 0u64..100) {
        let opt = solve(&items, capacity).value;
        let stats = bundle_stats(&items, capacity, opt, 90).unwrap();
        prop_assert!(stats.n90 <= stats.feasible);
        prop_assert!(stats.feasible <= (1u64 << items.len()) - 1);
        if opt > 0.0 {
            prop_assert!(stats.n90 >= 1);
        }
    }
}

// ── 6. Forced subsets ────────────────────────────────────────────────

proptest! {
    #[test]
    fn forced_then_greedy_never_beats_optimum(items in arb_items(8), capacity in 0u64..80) {
        let opt = solve(&items, capacity).value as u64;
        for v in best_by_forced_size(&items, capacity).into_iter().flatten() {
            prop_assert!(v <= opt, "forced+greedy {} > OPT {}", v, opt);
        }
    }

    #[test]
    fn allowing_larger_forced_sets_never_loses_value(
        items in arb_items(8),
        capacity in 0u64..80,
    ) {
        let opt = solve(&items, capacity).value as u64;
        let mut running = 0u64;
        let mut reached_at = None;
        for (k, best) in best_by_forced_size(&items, capacity).into_iter().enumerate() {
            let next = running.max(best.unwrap_or(0));
            prop_assert!(next >= running);
            running = next;
            if running == opt && reached_at.is_none() {
                reached_at = Some(k);
            }
        }
        // Forcing the optimal subset itself always reaches OPT.
        prop_assert_eq!(running, opt);

        let expected = match reached_at {
            Some(k) if k <= 6 => SahniK::Exact(k as u8),
            _ => SahniK::Exceeded,
        };
        prop_assert_eq!(sahni_k(&items, capacity, opt as f64), expected);
    }
}

#[test]
fn exact_size_forcing_can_lose_value() {
    // A heavy item fills the knapsack alone; two light ones cannot reach it.
    let items = from_columns(&[5.0, 1.0, 1.0], &[10.0, 1.0, 1.0]);
    let best = best_by_forced_size(&items, 5);
    assert_eq!(best[1], Some(10));
    assert_eq!(best[2], Some(2));
    assert_eq!(sahni_k(&items, 5, 10.0), SahniK::Exact(0));
}
