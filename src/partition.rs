use crate::error::FairKMedianError;
use crate::feasibility::SubsetMap;
use crate::types::{PointCount, PointIdx, SubsetIdx};

/// The k candidate pools derived from one feasible assignment: part i is the pool of the subset
/// that contributed the i-th center of the assignment. A subset with count e contributes e
/// consecutive parts. Parts refer to the subset map; no point data is copied.
#[derive(Debug, Clone)]
pub struct Partition<'a> {
    subset_map: &'a SubsetMap,
    parts: Vec<SubsetIdx>,
}

impl<'a> Partition<'a> {
    /// Expands an assignment into a partition with k parts.
    ///
    /// # Errors
    /// * [FairKMedianError::InvalidDimensions] if the assignment does not have one entry per subset.
    /// * [FairKMedianError::InvalidProblem] if the entries do not sum to k.
    /// * [FairKMedianError::DegenerateInput] if a part would have an empty pool.
    pub fn expand(
        assignment: &[PointCount],
        subset_map: &'a SubsetMap,
        k: PointCount,
    ) -> Result<Partition<'a>, FairKMedianError> {
        if assignment.len() != subset_map.len() {
            return Err(FairKMedianError::InvalidDimensions(format!(
                "Assignment has {} entries but there are {} subsets",
                assignment.len(),
                subset_map.len()
            )));
        }
        let mut parts: Vec<SubsetIdx> = Vec::with_capacity(k);
        for (s, &e) in assignment.iter().enumerate() {
            if e > 0 && subset_map.members(s).is_empty() {
                return Err(FairKMedianError::DegenerateInput(format!(
                    "Subset {} receives {} centers but has no points",
                    s, e
                )));
            }
            parts.extend(std::iter::repeat(s).take(e));
        }
        if parts.len() != k {
            return Err(FairKMedianError::InvalidProblem(format!(
                "Assignment {:?} opens {} centers, expected k = {}",
                assignment,
                parts.len(),
                k
            )));
        }
        Ok(Partition { subset_map, parts })
    }

    /// Number of parts, always k.
    pub fn k(&self) -> PointCount {
        self.parts.len()
    }

    /// Candidate pool of part i.
    pub fn pool(&self, i: usize) -> &'a [PointIdx] {
        self.subset_map.members(self.parts[i])
    }

    /// Subset that part i was taken from.
    pub fn subset_of(&self, i: usize) -> SubsetIdx {
        self.parts[i]
    }

    /// Iterator over the pools of all parts, in order.
    pub fn pools(&self) -> impl Iterator<Item = &'a [PointIdx]> + '_ {
        self.parts.iter().map(move |&s| self.subset_map.members(s))
    }
}
