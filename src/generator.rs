//////////////////////////////////////////////////////////////
//////////////////// module: generator ///////////////////////
//////////////////////////////////////////////////////////////

/// Synthetic instances for the self-test harness: Gaussian blobs for the points and random
/// group memberships with a requirement vector that is guaranteed to be satisfiable.
///
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::error::FairKMedianError;
use crate::feasibility::{ExhaustiveEnumerator, FeasibilityEnumerator};
use crate::space::Instance;
use crate::types::{GroupCount, PointCount, Requirement};

/// Draws n points in dimension d around `centers` blob centers chosen uniformly in
/// [-10, 10]^d. Points are split evenly over the blobs; returns the points and their blob.
pub fn make_blobs(
    n: PointCount,
    centers: usize,
    d: usize,
    cluster_std: f64,
    seed: u64,
) -> Result<(Vec<Vec<f64>>, Vec<usize>), FairKMedianError> {
    if centers == 0 || d == 0 {
        return Err(FairKMedianError::InvalidProblem(format!(
            "Cannot draw blobs with {} centers in dimension {}",
            centers, d
        )));
    }
    if !(cluster_std >= 0.0 && cluster_std.is_finite()) {
        return Err(FairKMedianError::InvalidProblem(format!(
            "cluster_std must be finite and non-negative, got {}",
            cluster_std
        )));
    }
    let noise = Normal::new(0.0, cluster_std)
        .map_err(|e| FairKMedianError::InvalidProblem(format!("cluster_std = {}: {}", cluster_std, e)))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let blob_centers: Vec<Vec<f64>> = (0..centers)
        .map(|_| (0..d).map(|_| rng.gen_range(-10.0..10.0)).collect())
        .collect();

    let mut points: Vec<Vec<f64>> = Vec::with_capacity(n);
    let mut labels: Vec<usize> = Vec::with_capacity(n);
    for (b, center) in blob_centers.iter().enumerate() {
        let size = n / centers + usize::from(b < n % centers);
        for _ in 0..size {
            points.push(center.iter().map(|c| c + noise.sample(&mut rng)).collect());
            labels.push(b);
        }
    }
    Ok((points, labels))
}

/// Creates a random membership matrix (n x t) and a requirement vector of length t such that at
/// least one assignment of k centers satisfies all requirements.
///
/// Every point belongs to 1..=max_freq random groups (exactly one if unique). Requirements are
/// drawn from [r_min, r_max] and lowered one by one until the instance becomes feasible.
#[allow(clippy::too_many_arguments)]
pub fn get_feasible_instance(
    t: GroupCount,
    n: PointCount,
    r_max: Requirement,
    r_min: Requirement,
    max_freq: GroupCount,
    k: PointCount,
    seed: u64,
    unique: bool,
) -> Result<(Vec<Vec<bool>>, Vec<Requirement>), FairKMedianError> {
    if t == 0 || max_freq == 0 || r_min > r_max || n < k {
        return Err(FairKMedianError::InvalidProblem(format!(
            "Cannot generate an instance with t = {}, n = {}, k = {}, max_freq = {}, r in [{}, {}]",
            t, n, k, max_freq, r_min, r_max
        )));
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let membership: Vec<Vec<bool>> = (0..n)
        .map(|_| {
            let count = if unique { 1 } else { rng.gen_range(1..=max_freq.min(t)) };
            let mut row = vec![false; t];
            for g in index::sample(&mut rng, t, count).iter() {
                row[g] = true;
            }
            row
        })
        .collect();

    let mut requirements: Vec<Requirement> = (0..t).map(|_| rng.gen_range(r_min..=r_max)).collect();

    // positions do not matter for feasibility
    let space = Instance::new(vec![vec![0.0]; n], membership)?;
    for (g, r) in requirements.iter_mut().enumerate() {
        *r = (*r).min(space.group_size(g)).min(k);
    }

    loop {
        let feasibility = ExhaustiveEnumerator.enumerate(&space, k, &requirements)?;
        if !feasibility.assignments.is_empty() {
            debug!(
                "Generated instance with requirements {:?} and {} feasible assignments",
                requirements,
                feasibility.assignments.len()
            );
            break;
        }
        let positive: Vec<usize> = (0..t).filter(|&g| requirements[g] > 0).collect();
        if positive.is_empty() {
            // with n >= k and no requirement the instance is always feasible
            return Err(FairKMedianError::InfeasibleInstance);
        }
        let g = positive[rng.gen_range(0..positive.len())];
        requirements[g] -= 1;
    }

    let membership = (0..n).map(|x| space.groups_of(x).to_vec()).collect();
    Ok((membership, requirements))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blobs_are_split_evenly() {
        let (points, labels) = make_blobs(100, 3, 2, 0.8, 12312).unwrap();
        assert_eq!(points.len(), 100);
        assert!(points.iter().all(|p| p.len() == 2));
        assert_eq!(labels.iter().filter(|&&l| l == 0).count(), 34);
        assert_eq!(labels.iter().filter(|&&l| l == 2).count(), 33);
    }

    #[test]
    fn blobs_are_reproducible() {
        assert_eq!(make_blobs(20, 2, 3, 1.0, 5).unwrap(), make_blobs(20, 2, 3, 1.0, 5).unwrap());
    }

    #[test]
    fn rejects_invalid_cluster_std() {
        for std in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                make_blobs(20, 2, 3, std, 5),
                Err(FairKMedianError::InvalidProblem(_))
            ));
        }
        assert!(make_blobs(20, 2, 3, 0.0, 5).is_ok());
    }

    #[test]
    fn generated_instance_is_feasible() {
        for seed in 0..10 {
            let (membership, requirements) = get_feasible_instance(3, 100, 3, 1, 3, 3, seed, false).unwrap();
            assert_eq!(membership.len(), 100);
            assert_eq!(requirements.len(), 3);
            assert!(membership.iter().all(|row| row.iter().any(|&b| b)));
            let space = Instance::new(vec![vec![0.0]; 100], membership).unwrap();
            let feasibility = ExhaustiveEnumerator.enumerate(&space, 3, &requirements).unwrap();
            assert!(!feasibility.assignments.is_empty());
        }
    }

    #[test]
    fn unique_memberships() {
        let (membership, _) = get_feasible_instance(4, 50, 2, 0, 3, 4, 1, true).unwrap();
        assert!(membership.iter().all(|row| row.iter().filter(|&&b| b).count() == 1));
    }
}
