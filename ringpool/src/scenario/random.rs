//! Seeded scenario generation for multi-seed testing.
//!
//! The same seed always yields the same ring and the same actions, so a
//! failing seed can be replayed on its own.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{Scenario, ScenarioBuilder};

/// A ring of `size` distinct ids in shuffled order.
///
/// Ids are drawn from `1..=4 * size` so that the maximum is not always the
/// last declared node.
pub fn random_ring(seed: u64, size: usize) -> ScenarioBuilder {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut pool: Vec<u64> = (1..=(size as u64).saturating_mul(4).max(1)).collect();
    pool.shuffle(&mut rng);
    pool.truncate(size);
    pool.shuffle(&mut rng);
    Scenario::ring(&pool)
}

/// A random ring with one election in round 1 and `failures` distinct
/// scheduled failures.
///
/// Failures never take down the whole ring: at least one node survives.
pub fn random_workload(seed: u64, size: usize, failures: usize) -> ScenarioBuilder {
    let builder = random_ring(seed, size);
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

    let mut ids: Vec<u64> = builder.declared().iter().map(|id| id.get()).collect();
    if ids.is_empty() {
        return builder;
    }

    let initiator = ids[rng.random_range(0..ids.len())];
    let mut builder = builder.elect(1, &[initiator]);

    ids.shuffle(&mut rng);
    for node in ids.iter().take(failures.min(size.saturating_sub(1))) {
        let round = rng.random_range(1..=3 * size as u64);
        builder = builder.fail(round, *node);
    }
    builder
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn same_seed_same_ring() {
        assert_eq!(random_ring(7, 10).declared(), random_ring(7, 10).declared());
    }

    #[test]
    fn ids_are_distinct() {
        for seed in 0..20 {
            let ids = random_ring(seed, 12).declared();
            let unique: BTreeSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), 12, "seed {seed}");
        }
    }

    #[test]
    fn workload_keeps_a_survivor() {
        let scenario = random_workload(3, 4, 10).build().expect("valid scenario");
        let failures = scenario
            .actions()
            .iter()
            .filter(|a| matches!(a.kind, crate::scenario::ActionKind::ScheduleFailure { .. }))
            .count();
        assert_eq!(failures, 3);
    }
}
