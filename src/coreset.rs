use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::RngCore;
use tracing::debug;

use crate::error::FairKMedianError;
use crate::gonzales::gonzales_heuristic;
use crate::space::Instance;
use crate::types::{Distance, PointCount, PointIdx};

/// A weighted sample of points whose weighted k-median cost approximates the cost of the full
/// instance. Weights are non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Coreset {
    positions: Vec<f64>,
    dim: usize,
    weights: Vec<f64>,
}

impl Coreset {
    /// Creates a coreset from its rows and weights.
    ///
    /// # Errors
    /// * [FairKMedianError::DegenerateInput] if there are no rows or a weight is negative or not finite.
    /// * [FairKMedianError::InvalidDimensions] if rows and weights disagree in length or a row has
    ///   not dimension dim.
    pub fn new(rows: Vec<Vec<f64>>, weights: Vec<f64>, dim: usize) -> Result<Coreset, FairKMedianError> {
        if rows.is_empty() {
            return Err(FairKMedianError::DegenerateInput("The coreset is empty.".to_string()));
        }
        if rows.len() != weights.len() {
            return Err(FairKMedianError::InvalidDimensions(format!(
                "The coreset has {} points but {} weights",
                rows.len(),
                weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(FairKMedianError::DegenerateInput(format!("Invalid coreset weight {}", w)));
        }
        let mut positions = Vec::with_capacity(rows.len() * dim);
        for row in rows.iter() {
            if row.len() != dim {
                return Err(FairKMedianError::InvalidDimensions(format!(
                    "Coreset point has dimension {}, expected {}",
                    row.len(),
                    dim
                )));
            }
            positions.extend_from_slice(row);
        }
        Ok(Coreset { positions, dim, weights })
    }

    /// Number of coreset points m.
    pub fn len(&self) -> PointCount {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn point(&self, i: usize) -> &[f64] {
        &self.positions[i * self.dim..(i + 1) * self.dim]
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

/// Builds a coreset for k-median over the full instance.
pub trait CoresetBuilder {
    fn build(
        &self,
        space: &Instance,
        k: PointCount,
        fraction: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Coreset, FairKMedianError>;
}

/// Sensitivity sampling around a farthest-first solution: a point is sampled with probability
/// proportional to d(p)/sum(d) + 1/|cluster(p)| and weighted by the inverse of its expected
/// number of draws. Repeated draws are merged into one weighted point.
#[derive(Debug, Default, Clone, Copy)]
pub struct SensitivityCoreset;

impl CoresetBuilder for SensitivityCoreset {
    fn build(
        &self,
        space: &Instance,
        k: PointCount,
        fraction: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Coreset, FairKMedianError> {
        let n = space.n();
        if n == 0 {
            return Err(FairKMedianError::DegenerateInput(
                "Cannot build a coreset of an empty instance.".to_string(),
            ));
        }
        if !fraction.is_finite() || fraction <= 0.0 {
            return Err(FairKMedianError::DegenerateInput(format!(
                "Coreset fraction must be positive, got {}",
                fraction
            )));
        }
        let m = (fraction * n as f64).ceil() as usize;
        if m == 0 {
            return Err(FairKMedianError::DegenerateInput("The coreset would be empty.".to_string()));
        }

        let (seeds, dist) = gonzales_heuristic(space, k);

        // cluster of every point w.r.t. the seeds
        let mut cluster_size = vec![0usize; seeds.len()];
        let cluster_of: Vec<usize> = (0..n)
            .map(|x| {
                let mut best = (Distance::INFINITY, 0);
                for (j, &c) in seeds.iter().enumerate() {
                    let d = space.dist(x, c);
                    if d < best.0 {
                        best = (d, j);
                    }
                }
                cluster_size[best.1] += 1;
                best.1
            })
            .collect();

        let total: Distance = dist.iter().sum();
        let sensitivity: Vec<f64> = (0..n)
            .map(|x| {
                let share = if total > 0.0 { dist[x] / total } else { 0.0 };
                share + 1.0 / cluster_size[cluster_of[x]] as f64
            })
            .collect();
        let sum_sensitivity: f64 = sensitivity.iter().sum();

        let sampler = WeightedIndex::new(&sensitivity)
            .map_err(|e| FairKMedianError::DegenerateInput(format!("Cannot sample coreset: {}", e)))?;

        let mut weight_of: BTreeMap<PointIdx, f64> = BTreeMap::new();
        for _ in 0..m {
            let x = sampler.sample(rng);
            let prob = sensitivity[x] / sum_sensitivity;
            *weight_of.entry(x).or_insert(0.0) += 1.0 / (m as f64 * prob);
        }

        let rows: Vec<Vec<f64>> = weight_of.keys().map(|&x| space.position(x).to_vec()).collect();
        let weights: Vec<f64> = weight_of.values().cloned().collect();
        debug!(
            "Sampled coreset of {} distinct points ({} draws), total weight {:.2}",
            rows.len(),
            m,
            weights.iter().sum::<f64>()
        );
        Coreset::new(rows, weights, space.dim())
    }
}
