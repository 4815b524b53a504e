///////////////////////////////////////////////////////////////
///////////////////// module: space ///////////////////////////
///////////////////////////////////////////////////////////////

/// Module space maintains the immutable input of a fair k-median run: points in the
/// d-dimensional Euclidean space, each of which belongs to a set of groups.
///
/// - Positions can be obtained by position(x : PointIdx) -> &[f64]
/// - Distances can be obtained by dist(x1 : PointIdx, x2 : PointIdx) -> Distance or by
///   euclidean(a, b) for arbitrary coordinates (e.g. centers that are not stored in the space)
/// - Group memberships can be obtained by groups_of(x : PointIdx) -> &[bool]
/// - The number of points by n(), the dimension by dim() and the number of groups by t().
///
use crate::error::FairKMedianError;
use crate::types::{Distance, GroupCount, GroupIdx, PointCount, PointIdx};

/// The Euclidean distance between two coordinate slices of equal length.
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> Distance {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// A set of points in R^d where each point carries a membership profile over t groups.
/// Positions are stored row-major in a flat vector.
#[derive(Debug, Clone)]
pub struct Instance {
    positions: Vec<f64>,
    dim: usize,
    membership: Vec<Vec<bool>>,
    t: GroupCount,
}

impl Instance {
    /// Creates a new instance from a list of points (all of the same dimension) and a
    /// membership matrix with one row per point and one column per group.
    ///
    /// # Errors
    ///
    /// * [FairKMedianError::InvalidDimensions] if the rows do not have matching widths
    ///   or the number of membership rows differs from the number of points.
    /// * [FairKMedianError::DegenerateInput] if a coordinate is NaN or infinite.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fair_k_median::space::Instance;
    /// let instance = Instance::new(
    ///     vec![vec![0.0, 0.0], vec![3.0, 4.0]],
    ///     vec![vec![true, false], vec![false, true]]).unwrap();
    /// assert_eq!(instance.n(), 2);
    /// assert_eq!(instance.dist(0, 1), 5.0);
    /// ```
    pub fn new(points: Vec<Vec<f64>>, membership: Vec<Vec<bool>>) -> Result<Instance, FairKMedianError> {
        if points.len() != membership.len() {
            return Err(FairKMedianError::InvalidDimensions(format!(
                "Number of points: {} do not match number of membership rows: {}",
                points.len(),
                membership.len()
            )));
        }
        let dim = points.first().map_or(0, |p| p.len());
        let t = membership.first().map_or(0, |m| m.len());

        let mut positions: Vec<f64> = Vec::with_capacity(points.len() * dim);
        for (i, (p, m)) in points.iter().zip(membership.iter()).enumerate() {
            if p.len() != dim {
                return Err(FairKMedianError::InvalidDimensions(format!(
                    "Point {} has dimension {}, expected {}",
                    i,
                    p.len(),
                    dim
                )));
            }
            if m.len() != t {
                return Err(FairKMedianError::InvalidDimensions(format!(
                    "Membership row {} has {} entries, expected {}",
                    i,
                    m.len(),
                    t
                )));
            }
            if let Some(c) = p.iter().find(|c| !c.is_finite()) {
                return Err(FairKMedianError::DegenerateInput(format!(
                    "Point {} has the non-finite coordinate {}",
                    i, c
                )));
            }
            positions.extend_from_slice(p);
        }

        Ok(Instance {
            positions,
            dim,
            membership,
            t,
        })
    }

    /// Return the number of points.
    pub fn n(&self) -> PointCount {
        self.membership.len()
    }

    /// Return the dimension d of the space.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Return the number of groups t.
    pub fn t(&self) -> GroupCount {
        self.t
    }

    /// Returns the coordinates of point x.
    pub fn position(&self, x: PointIdx) -> &[f64] {
        &self.positions[x * self.dim..(x + 1) * self.dim]
    }

    /// Returns the distance between two points x1 and x2.
    pub fn dist(&self, x1: PointIdx, x2: PointIdx) -> Distance {
        euclidean(self.position(x1), self.position(x2))
    }

    /// Returns the membership profile of point x (one flag per group).
    pub fn groups_of(&self, x: PointIdx) -> &[bool] {
        &self.membership[x]
    }

    /// Returns the number of points that belong to group g.
    pub fn group_size(&self, g: GroupIdx) -> PointCount {
        self.membership.iter().filter(|m| m[g]).count()
    }

    /// Iterator over the coordinates of all points, in index order.
    pub fn positions(&self) -> std::slice::ChunksExact<'_, f64> {
        self.positions.chunks_exact(self.dim.max(1))
    }

    /// Flat row-major coordinates of all points.
    pub fn raw_positions(&self) -> &[f64] {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ragged_rows() {
        let err = Instance::new(vec![vec![0.0, 0.0], vec![1.0]], vec![vec![true], vec![true]]);
        assert!(matches!(err, Err(FairKMedianError::InvalidDimensions(_))));

        let err = Instance::new(vec![vec![0.0], vec![1.0]], vec![vec![true]]);
        assert!(matches!(err, Err(FairKMedianError::InvalidDimensions(_))));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = Instance::new(vec![vec![0.0, 0.0], vec![1.0, bad]], vec![vec![true], vec![true]]);
            assert!(matches!(err, Err(FairKMedianError::DegenerateInput(_))));
        }
    }

    #[test]
    fn positions_and_groups() {
        let instance = Instance::new(
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]],
            vec![vec![true, false], vec![true, true], vec![false, false]],
        )
        .unwrap();
        assert_eq!(instance.dim(), 3);
        assert_eq!(instance.t(), 2);
        assert_eq!(instance.position(1), &[4.0, 5.0, 6.0]);
        assert_eq!(instance.group_size(0), 2);
        assert_eq!(instance.group_size(1), 1);
        assert_eq!(instance.positions().count(), 3);
        assert!((instance.dist(0, 2) - (108.0f64).sqrt()).abs() < 1e-12);
    }
}
