use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::coreset::Coreset;
use crate::error::FairKMedianError;
use crate::space::{euclidean, Instance};
use crate::types::{Distance, PointCount, PointIdx};
use crate::utilities::with_thread_pool;

/// Key of a bin: the exponent j of base * (1 + eps)^j, or None for the zero distance.
pub type BinKey = Option<i32>;

/// Distances between every coreset point and every point of the instance, each rounded up to
/// the next power of (1 + eps) relative to the smallest positive distance.
/// bins holds the distinct rounded values in increasing order and index maps the key of a bin to
/// its position in bins.
#[derive(Debug, Clone)]
pub struct BinnedDistances {
    n: PointCount,
    distances: Vec<Distance>,
    bins: Vec<Distance>,
    index: HashMap<BinKey, usize>,
}

impl BinnedDistances {
    /// The rounded distance between coreset point c and point x of the instance.
    #[inline]
    pub fn get(&self, c: usize, x: PointIdx) -> Distance {
        self.distances[c * self.n + x]
    }

    /// The rounded distances of coreset point c to all points of the instance.
    pub fn row(&self, c: usize) -> &[Distance] {
        &self.distances[c * self.n..(c + 1) * self.n]
    }

    /// Number of coreset points (rows).
    pub fn m(&self) -> usize {
        if self.n == 0 {
            0
        } else {
            self.distances.len() / self.n
        }
    }

    /// The distinct rounded distances, in increasing order.
    pub fn bins(&self) -> &[Distance] {
        &self.bins
    }

    /// Position of the bin with the given key in bins().
    pub fn position_of(&self, key: BinKey) -> Option<usize> {
        self.index.get(&key).copied()
    }
}

/// Precomputes distance lookups between a coreset and the instance.
pub trait DistanceBinner {
    fn bin(&self, space: &Instance, coreset: &Coreset, k: PointCount) -> Result<BinnedDistances, FairKMedianError>;
}

/// Geometric binning with growth factor (1 + epsilon).
#[derive(Debug, Clone, Copy)]
pub struct GeometricBinner {
    pub epsilon: f64,
    pub thread_count: usize,
}

impl Default for GeometricBinner {
    fn default() -> Self {
        GeometricBinner {
            epsilon: 0.1,
            thread_count: num_cpus::get(),
        }
    }
}

/// Rounds d up to base * (1 + eps)^j and returns (key, rounded value). Requires d >= base for
/// positive d. The exponent is taken in log space so that widely spread distances stay finite.
fn round_up(d: Distance, base: Distance, growth: f64) -> (BinKey, Distance) {
    if d <= 0.0 {
        return (None, 0.0);
    }
    let (log_base, log_growth) = (base.ln(), growth.ln());
    let value_at = |j: i32| -> Distance {
        if j == 0 {
            base
        } else {
            (log_base + j as f64 * log_growth).exp().min(Distance::MAX)
        }
    };
    let mut j = ((d.ln() - log_base) / log_growth).ceil().max(0.0) as i32;
    // one step is enough to absorb the floating point error of ln
    if value_at(j) < d {
        j += 1;
    } else if j > 0 && value_at(j - 1) >= d {
        j -= 1;
    }
    (Some(j), value_at(j))
}

impl DistanceBinner for GeometricBinner {
    fn bin(&self, space: &Instance, coreset: &Coreset, _k: PointCount) -> Result<BinnedDistances, FairKMedianError> {
        let n = space.n();
        if n == 0 || coreset.is_empty() {
            return Err(FairKMedianError::DegenerateInput(format!(
                "Cannot bin distances between {} coreset points and {} points.",
                coreset.len(),
                n
            )));
        }
        if coreset.dim() != space.dim() {
            return Err(FairKMedianError::InvalidDimensions(format!(
                "Coreset has dimension {}, instance has dimension {}",
                coreset.dim(),
                space.dim()
            )));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(FairKMedianError::InvalidProblem(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        let growth = 1.0 + self.epsilon;

        let mut distances: Vec<Distance> = vec![0.0; coreset.len() * n];
        with_thread_pool(self.thread_count, || {
            distances.par_chunks_mut(n).enumerate().for_each(|(c, row)| {
                let center = coreset.point(c);
                for (x, d) in row.iter_mut().enumerate() {
                    *d = euclidean(center, space.position(x));
                }
            })
        });

        let base = distances
            .iter()
            .cloned()
            .filter(|d| *d > 0.0)
            .fold(Distance::INFINITY, Distance::min);

        let mut keys: Vec<BinKey> = Vec::new();
        let mut value_of: HashMap<BinKey, Distance> = HashMap::new();
        if base.is_finite() {
            for d in distances.iter_mut() {
                let (key, rounded) = round_up(*d, base, growth);
                *d = rounded;
                if value_of.insert(key, rounded).is_none() {
                    keys.push(key);
                }
            }
        } else {
            // all distances are zero
            keys.push(None);
            value_of.insert(None, 0.0);
        }
        keys.sort();

        let bins: Vec<Distance> = keys.iter().map(|key| value_of[key]).collect();
        let index: HashMap<BinKey, usize> = keys.iter().enumerate().map(|(pos, &key)| (key, pos)).collect();

        debug!(
            "Binned {} x {} coreset-to-point distances into {} bins (1 + eps = {})",
            coreset.len(),
            n,
            bins.len(),
            growth
        );
        Ok(BinnedDistances {
            n,
            distances,
            bins,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_upward_and_tight() {
        let growth = 1.1;
        for &d in [1.0, 1.05, 1.1, 2.0, 3.7, 100.0].iter() {
            let (key, rounded) = round_up(d, 1.0, growth);
            assert!(rounded >= d);
            assert!(rounded <= d * growth * (1.0 + 1e-12));
            assert!(key.is_some());
        }
        assert_eq!(round_up(0.0, 1.0, growth), (None, 0.0));
        assert_eq!(round_up(1.0, 1.0, growth), (Some(0), 1.0));
    }

    #[test]
    fn rounding_handles_extreme_spread() {
        let growth = 1.1;
        let d = 1e300;
        let (key, rounded) = round_up(d, 1e-300, growth);
        assert!(rounded.is_finite());
        assert!(rounded >= d);
        assert!(rounded <= d * growth * (1.0 + 1e-9));
        let expected = ((d.ln() - 1e-300f64.ln()) / growth.ln()).ceil() as i32;
        assert!((key.unwrap() - expected).abs() <= 1);

        // close to the largest float the rounded value saturates instead of overflowing
        let (_, rounded) = round_up(Distance::MAX, 1.0, growth);
        assert_eq!(rounded, Distance::MAX);
    }

    #[test]
    fn binned_matrix_matches_coreset() {
        let space = Instance::new(
            vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![4.0, 0.0]],
            vec![vec![true]; 3],
        )
        .unwrap();
        let coreset = Coreset::new(vec![vec![0.0, 0.0], vec![4.0, 0.0]], vec![2.0, 1.0], 2).unwrap();
        let binner = GeometricBinner {
            epsilon: 0.5,
            thread_count: 2,
        };
        let binned = binner.bin(&space, &coreset, 2).unwrap();
        assert_eq!(binned.m(), 2);
        assert_eq!(binned.get(0, 0), 0.0);
        assert_eq!(binned.get(0, 1), 1.0); // smallest positive distance is the base
        assert!(binned.get(1, 1) >= 3.0 && binned.get(1, 1) <= 4.5);
        assert_eq!(binned.get(1, 2), 0.0);
        // bins are sorted and indexed
        assert!(binned.bins().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(binned.position_of(None), Some(0));
        assert_eq!(binned.position_of(Some(0)), Some(1));
        for c in 0..binned.m() {
            for &d in binned.row(c) {
                assert!(binned.bins().contains(&d));
            }
        }
    }

    #[test]
    fn rejects_empty_space() {
        let space = Instance::new(vec![], vec![]).unwrap();
        let coreset = Coreset::new(vec![vec![0.0]], vec![1.0], 1).unwrap();
        assert!(matches!(
            GeometricBinner::default().bin(&space, &coreset, 1),
            Err(FairKMedianError::DegenerateInput(_))
        ));
    }
}
