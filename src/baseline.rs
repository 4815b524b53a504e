use rayon::prelude::*;
use tracing::debug;

use crate::error::FairKMedianError;
use crate::gonzales::gonzales_heuristic;
use crate::space::Instance;
use crate::types::{Cost, Distance, PointCount, PointIdx};
use crate::utilities::with_thread_pool;

/// Reference cost of unconstrained k-median on the full instance.
pub trait BaselineComparator {
    fn baseline_cost(&self, space: &Instance, k: PointCount) -> Result<Cost, FairKMedianError>;
}

/// Single-swap local search over the points of the instance, started from the farthest-first
/// centers. Each round applies the best improving swap.
#[derive(Debug, Clone, Copy)]
pub struct SwapLocalSearch {
    pub max_iters: usize,
    pub thread_count: usize,
}

impl Default for SwapLocalSearch {
    fn default() -> Self {
        SwapLocalSearch {
            max_iters: 100,
            thread_count: num_cpus::get(),
        }
    }
}

fn total_distance(space: &Instance, medoids: &[PointIdx]) -> Cost {
    (0..space.n())
        .map(|x| {
            medoids
                .iter()
                .map(|&c| space.dist(x, c))
                .fold(Distance::INFINITY, Distance::min)
        })
        .sum()
}

impl BaselineComparator for SwapLocalSearch {
    fn baseline_cost(&self, space: &Instance, k: PointCount) -> Result<Cost, FairKMedianError> {
        let n = space.n();
        if n == 0 || k == 0 {
            return Err(FairKMedianError::DegenerateInput(format!(
                "Local search needs points and centers, got n = {}, k = {}",
                n, k
            )));
        }
        let (mut medoids, _) = gonzales_heuristic(space, k);
        let mut cost = total_distance(space, &medoids);

        let mut iters = 0;
        while iters < self.max_iters {
            iters += 1;
            let current = &medoids;
            // best swap (cost, slot, point); ties go to the smallest slot and point
            let best_swap = with_thread_pool(self.thread_count, || {
                (0..n)
                    .into_par_iter()
                    .filter(|x| !current.contains(x))
                    .flat_map_iter(|x| {
                        (0..current.len()).map(move |slot| {
                            let mut swapped = current.clone();
                            swapped[slot] = x;
                            (total_distance(space, &swapped), slot, x)
                        })
                    })
                    .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)))
            });
            match best_swap {
                Some((swap_cost, slot, x)) if swap_cost < cost * (1.0 - 1e-9) => {
                    medoids[slot] = x;
                    cost = swap_cost;
                }
                _ => break,
            }
        }
        debug!("Local search finished after {} rounds with medoids {:?}", iters, medoids);
        Ok(cost / n as Cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_cluster_medians() {
        let points: Vec<Vec<f64>> = vec![0.0, 1.0, 2.0, 100.0, 101.0, 102.0, 50.0].into_iter().map(|x| vec![x]).collect();
        let space = Instance::new(points, vec![vec![true]; 7]).unwrap();
        let cost = SwapLocalSearch {
            max_iters: 50,
            thread_count: 2,
        }
        .baseline_cost(&space, 3)
        .unwrap();
        // medians 1, 101, 50 -> total distance 4
        assert!((cost - 4.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_empty_instance() {
        let space = Instance::new(vec![], vec![]).unwrap();
        assert!(matches!(
            SwapLocalSearch::default().baseline_cost(&space, 2),
            Err(FairKMedianError::DegenerateInput(_))
        ));
    }
}
