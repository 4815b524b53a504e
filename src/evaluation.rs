use rayon::prelude::*;

use crate::clustering::Centers;
use crate::error::FairKMedianError;
use crate::space::Instance;
use crate::types::Cost;
use crate::utilities::with_thread_pool;

/// Number of points per partial sum. Fixed, so that the cost does not depend on the number of
/// threads.
const CHUNK_SIZE: usize = 1024;

/// The average distance of all points of the instance to their closest center:
/// cost(S) = 1/N * sum_i min_j dist(x_i, S_j).
///
/// # Errors
/// * [FairKMedianError::DegenerateInput] if the instance or the center set is empty.
/// * [FairKMedianError::InvalidDimensions] if the centers do not live in the space of the instance.
pub fn true_cost(space: &Instance, centers: &Centers, thread_count: usize) -> Result<Cost, FairKMedianError> {
    let n = space.n();
    if n == 0 {
        return Err(FairKMedianError::DegenerateInput(
            "Cannot evaluate the cost of an empty instance.".to_string(),
        ));
    }
    if centers.m() == 0 {
        return Err(FairKMedianError::DegenerateInput("Cannot evaluate an empty set of centers.".to_string()));
    }
    if centers.dim() != space.dim() {
        return Err(FairKMedianError::InvalidDimensions(format!(
            "Centers have dimension {}, instance has dimension {}",
            centers.dim(),
            space.dim()
        )));
    }

    let dim = space.dim();
    if dim == 0 {
        return Err(FairKMedianError::DegenerateInput("The points have dimension 0.".to_string()));
    }
    let partial_sums: Vec<Cost> = with_thread_pool(thread_count, || {
        space
            .raw_positions()
            .par_chunks(CHUNK_SIZE * dim)
            .map(|chunk| chunk.chunks_exact(dim).map(|x| centers.dist_to_closest(x)).sum::<Cost>())
            .collect()
    });
    let cost = partial_sums.iter().sum::<Cost>() / n as Cost;

    if !cost.is_finite() {
        return Err(FairKMedianError::DegenerateInput(format!("The cost evaluated to {}", cost)));
    }
    Ok(cost)
}

/// Running minimum over evaluated candidates, together with the payload of the best one.
/// Ties keep the candidate folded in first.
#[derive(Debug, Clone)]
pub struct RunningMinimum<T> {
    best: Option<(Cost, T)>,
}

impl<T> Default for RunningMinimum<T> {
    fn default() -> Self {
        RunningMinimum { best: None }
    }
}

impl<T> RunningMinimum<T> {
    pub fn new() -> RunningMinimum<T> {
        RunningMinimum::default()
    }

    /// Folds a candidate in. Returns true if it became the new best.
    pub fn fold(&mut self, cost: Cost, payload: T) -> bool {
        match self.best {
            Some((best, _)) if best <= cost => false,
            _ => {
                self.best = Some((cost, payload));
                true
            }
        }
    }

    /// Combines two running minima.
    pub fn merge(mut self, other: RunningMinimum<T>) -> RunningMinimum<T> {
        if let Some((cost, payload)) = other.best {
            self.fold(cost, payload);
        }
        self
    }

    /// The best cost seen so far, or None if nothing has been folded in.
    pub fn best(&self) -> Option<Cost> {
        self.best.as_ref().map(|(cost, _)| *cost)
    }

    pub fn into_inner(self) -> Option<(Cost, T)> {
        self.best
    }
}
