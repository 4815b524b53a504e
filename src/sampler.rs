use rand::seq::SliceRandom;
use rand::RngCore;

use crate::feasibility::FeasibleAssignment;
use crate::types::PointCount;

/// Number of feasible assignments to sample out of n, tiered by the size of the pool:
/// 10% for n <= 200, 5% for 200 < n <= 600 and 3% above, each rounded down.
pub fn sampling_threshold(n: PointCount) -> PointCount {
    if n > 600 {
        n * 3 / 100
    } else if n > 200 {
        n * 5 / 100
    } else {
        n / 10
    }
}

/// The sample size actually used for a pool of size n.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// The value of the tier formula.
    pub tiered: PointCount,
    /// The sample size, i.e., the tier value raised to the minimum (but never above n).
    pub value: PointCount,
}

impl Threshold {
    /// Applies the tier formula to a pool of size n. For a non-empty pool the result is raised
    /// to min_threshold, capped at n.
    pub fn for_pool(n: PointCount, min_threshold: PointCount) -> Threshold {
        let tiered = sampling_threshold(n);
        let value = if n > 0 { tiered.max(min_threshold.min(n)) } else { 0 };
        Threshold { tiered, value }
    }

    /// Whether the tier formula selected fewer assignments than are sampled.
    pub fn raised(&self) -> bool {
        self.value > self.tiered
    }
}

/// Shuffles the pool uniformly at random and returns its first threshold entries.
pub fn sample_candidates<'a>(
    pool: &'a [FeasibleAssignment],
    threshold: PointCount,
    rng: &mut dyn RngCore,
) -> Vec<&'a FeasibleAssignment> {
    let mut shuffled: Vec<&FeasibleAssignment> = pool.iter().collect();
    shuffled.shuffle(rng);
    shuffled.truncate(threshold);
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn tier_boundaries() {
        assert_eq!(sampling_threshold(0), 0);
        assert_eq!(sampling_threshold(9), 0);
        assert_eq!(sampling_threshold(10), 1);
        assert_eq!(sampling_threshold(200), 20);
        assert_eq!(sampling_threshold(201), 10);
        assert_eq!(sampling_threshold(600), 30);
        assert_eq!(sampling_threshold(601), 18);
        assert_eq!(sampling_threshold(1000), 30);
    }

    #[test]
    fn threshold_within_pool() {
        for n in 0..2000 {
            let t = sampling_threshold(n);
            assert!(t <= n);
            let threshold = Threshold::for_pool(n, 1);
            assert!(threshold.value <= n);
            if n > 0 {
                assert!(threshold.value >= 1);
            }
        }
    }

    #[test]
    fn small_pools_are_raised() {
        let threshold = Threshold::for_pool(5, 1);
        assert_eq!(threshold.tiered, 0);
        assert_eq!(threshold.value, 1);
        assert!(threshold.raised());

        let threshold = Threshold::for_pool(0, 1);
        assert_eq!(threshold.value, 0);
        assert!(!threshold.raised());

        let threshold = Threshold::for_pool(150, 1);
        assert_eq!(threshold.value, 15);
        assert!(!threshold.raised());

        // the minimum never exceeds the pool
        assert_eq!(Threshold::for_pool(3, 10).value, 3);
    }

    #[test]
    fn sample_without_replacement() {
        let pool: Vec<FeasibleAssignment> = (0..50).map(|i| vec![i, 50 - i]).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let sample = sample_candidates(&pool, 5, &mut rng);
        assert_eq!(sample.len(), 5);
        let mut firsts: Vec<usize> = sample.iter().map(|a| a[0]).collect();
        firsts.sort();
        firsts.dedup();
        assert_eq!(firsts.len(), 5);
    }

    #[test]
    fn sample_is_reproducible() {
        let pool: Vec<FeasibleAssignment> = (0..300).map(|i| vec![i]).collect();
        let a = sample_candidates(&pool, 15, &mut ChaCha8Rng::seed_from_u64(3));
        let b = sample_candidates(&pool, 15, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
        let c = sample_candidates(&pool, 15, &mut ChaCha8Rng::seed_from_u64(4));
        assert_ne!(a, c);
    }

    #[test]
    fn empty_pool_gives_empty_sample() {
        let pool: Vec<FeasibleAssignment> = Vec::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(sample_candidates(&pool, 0, &mut rng).is_empty());
    }
}
