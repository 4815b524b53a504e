//////////////////////////////////////////////////////////////
//////////////////// module: solver //////////////////////////
//////////////////////////////////////////////////////////////

/// Partition-respecting k-median on a coreset.
///
/// For every part the optimal center c* is replaced by the pool point closest to the coreset
/// point ("leader") that is closest to c*. By the triangle inequality this costs at most a factor
/// 3, and evaluating on distances rounded to (1 + eps)-bins adds the eps. Enumerating one leader
/// candidate per part is exponential only in k.
///
use tracing::trace;

use crate::binning::BinnedDistances;
use crate::coreset::Coreset;
use crate::error::FairKMedianError;
use crate::partition::Partition;
use crate::space::Instance;
use crate::types::{Cost, Distance, PointCount, PointIdx};

/// Chooses one center per part of a partition, minimizing the coreset-weighted k-median cost.
pub trait PartitionSolver {
    /// Returns the (approximate) average coreset cost and the coordinates of the k centers.
    fn solve(
        &self,
        partition: &Partition,
        space: &Instance,
        coreset: &Coreset,
        binned: &BinnedDistances,
        k: PointCount,
    ) -> Result<(Cost, Vec<Vec<f64>>), FairKMedianError>;
}

/// Leader guessing with branch and bound. Consecutive parts with the same pool receive distinct
/// centers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeaderGuessSolver;

/// A maximal run of consecutive parts sharing the same pool.
struct Run {
    start: usize,
    len: usize,
    candidates: Vec<PointIdx>,
}

struct Search<'s> {
    binned: &'s BinnedDistances,
    weights: &'s [f64],
    runs: Vec<Run>,
    run_of_part: Vec<usize>,
    // suffix_lb[i][c]: smallest distance of coreset point c to any candidate of parts i, i+1, ...
    suffix_lb: Vec<Vec<Distance>>,
    // closest[i][c]: distance of coreset point c to the centers chosen for parts 0..i
    closest: Vec<Vec<Distance>>,
    chosen: Vec<usize>,
    best_cost: Cost,
    best: Option<Vec<PointIdx>>,
}

fn candidates_for_pool(pool: &[PointIdx], binned: &BinnedDistances, needed: usize) -> Vec<PointIdx> {
    let mut candidates: Vec<PointIdx> = (0..binned.m())
        .filter_map(|c| {
            pool.iter()
                .cloned()
                .min_by(|&x, &y| binned.get(c, x).total_cmp(&binned.get(c, y)).then(x.cmp(&y)))
        })
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    // pad with further pool points so that every part of the run can get its own center
    let wanted = needed.min(pool.len());
    for &x in pool.iter() {
        if candidates.len() >= wanted {
            break;
        }
        if let Err(pos) = candidates.binary_search(&x) {
            candidates.insert(pos, x);
        }
    }
    candidates
}

impl<'s> Search<'s> {
    fn lower_bound(&self, part: usize) -> Cost {
        let current = &self.closest[part];
        let rest = &self.suffix_lb[part];
        self.weights
            .iter()
            .enumerate()
            .map(|(c, w)| w * current[c].min(rest[c]))
            .sum()
    }

    fn descend(&mut self, part: usize) {
        let k = self.chosen.len();
        if part == k {
            let cost: Cost = self
                .weights
                .iter()
                .zip(self.closest[k].iter())
                .map(|(w, d)| w * d)
                .sum();
            if cost < self.best_cost {
                trace!("New best tuple {:?} with coreset cost {}", self.chosen, cost);
                self.best_cost = cost;
                let run_of_part = &self.run_of_part;
                let runs = &self.runs;
                self.best = Some(
                    self.chosen
                        .iter()
                        .enumerate()
                        .map(|(i, &pos)| runs[run_of_part[i]].candidates[pos])
                        .collect(),
                );
            }
            return;
        }
        if self.lower_bound(part) >= self.best_cost {
            return;
        }

        let run = &self.runs[self.run_of_part[part]];
        let offset = part - run.start; // position of part within its run
        let remaining_in_run = run.len - offset - 1;
        let first = if offset == 0 { 0 } else { self.chosen[part - 1] + 1 };
        let len = run.candidates.len();
        let last = if len >= remaining_in_run + 1 { len - remaining_in_run } else { 0 };

        for pos in first..last {
            let x = self.runs[self.run_of_part[part]].candidates[pos];
            let (done, todo) = self.closest.split_at_mut(part + 1);
            let before = &done[part];
            let after = &mut todo[0];
            for (c, d) in after.iter_mut().enumerate() {
                *d = before[c].min(self.binned.get(c, x));
            }
            self.chosen[part] = pos;
            self.descend(part + 1);
        }
    }
}

impl PartitionSolver for LeaderGuessSolver {
    fn solve(
        &self,
        partition: &Partition,
        space: &Instance,
        coreset: &Coreset,
        binned: &BinnedDistances,
        k: PointCount,
    ) -> Result<(Cost, Vec<Vec<f64>>), FairKMedianError> {
        if partition.k() != k {
            return Err(FairKMedianError::InvalidProblem(format!(
                "Partition has {} parts, expected k = {}",
                partition.k(),
                k
            )));
        }
        if coreset.is_empty() || binned.m() != coreset.len() {
            return Err(FairKMedianError::DegenerateInput(format!(
                "Binned distances cover {} coreset points, the coreset has {}",
                binned.m(),
                coreset.len()
            )));
        }
        let m = coreset.len();

        // group consecutive parts with the same pool into runs
        let mut runs: Vec<Run> = Vec::new();
        let mut run_of_part: Vec<usize> = Vec::with_capacity(k);
        for i in 0..k {
            let same_as_previous = i > 0 && partition.subset_of(i) == partition.subset_of(i - 1);
            if same_as_previous {
                if let Some(run) = runs.last_mut() {
                    run.len += 1;
                }
            } else {
                runs.push(Run {
                    start: i,
                    len: 1,
                    candidates: Vec::new(),
                });
            }
            run_of_part.push(runs.len() - 1);
        }
        for run in runs.iter_mut() {
            let pool = partition.pool(run.start);
            if pool.is_empty() {
                return Err(FairKMedianError::DegenerateInput(format!(
                    "Part {} has an empty candidate pool",
                    run.start
                )));
            }
            run.candidates = candidates_for_pool(pool, binned, run.len);
        }

        let mut suffix_lb: Vec<Vec<Distance>> = vec![vec![Distance::INFINITY; m]; k + 1];
        for i in (0..k).rev() {
            let candidates = &runs[run_of_part[i]].candidates;
            for c in 0..m {
                let closest = candidates
                    .iter()
                    .map(|&x| binned.get(c, x))
                    .fold(Distance::INFINITY, Distance::min);
                suffix_lb[i][c] = suffix_lb[i + 1][c].min(closest);
            }
        }

        let mut search = Search {
            binned,
            weights: coreset.weights(),
            runs,
            run_of_part,
            suffix_lb,
            closest: vec![vec![Distance::INFINITY; m]; k + 1],
            chosen: vec![0; k],
            best_cost: Cost::INFINITY,
            best: None,
        };
        search.descend(0);

        let total_weight = coreset.total_weight();
        match search.best {
            Some(points) => {
                let cost = if total_weight > 0.0 {
                    search.best_cost / total_weight
                } else {
                    0.0
                };
                Ok((cost, points.iter().map(|&x| space.position(x).to_vec()).collect()))
            }
            None => Err(FairKMedianError::SolverContractViolation(format!(
                "No combination of {} distinct centers could be drawn from the partition",
                k
            ))),
        }
    }
}
