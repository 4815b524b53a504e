//////////////////////////////////////////////////////////////
//////////////////// module: feasibility /////////////////////
//////////////////////////////////////////////////////////////

/// Points with identical membership profiles form a subset. A feasible assignment states how
/// many centers are taken from each subset: the entries sum to k and, aggregated by group,
/// every group requirement is met.
///
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::FairKMedianError;
use crate::space::Instance;
use crate::types::{PointCount, PointIdx, Requirement, SubsetIdx};

/// Number of centers per subset; indexed like the [SubsetMap].
pub type FeasibleAssignment = Vec<PointCount>;

/// Partition of the point set into subsets of identical group membership. Subsets are
/// ordered lexicographically by their membership profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetMap {
    profiles: Vec<Vec<bool>>,
    members: Vec<Vec<PointIdx>>,
}

impl SubsetMap {
    /// Groups the points of the instance by membership profile.
    pub fn from_instance(space: &Instance) -> SubsetMap {
        let mut by_profile: BTreeMap<&[bool], Vec<PointIdx>> = BTreeMap::new();
        for x in 0..space.n() {
            by_profile.entry(space.groups_of(x)).or_default().push(x);
        }
        let (profiles, members): (Vec<Vec<bool>>, Vec<Vec<PointIdx>>) = by_profile
            .into_iter()
            .map(|(profile, points)| (profile.to_vec(), points))
            .unzip();
        SubsetMap { profiles, members }
    }

    /// Number of subsets.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The membership profile shared by all points of subset s.
    pub fn profile(&self, s: SubsetIdx) -> &[bool] {
        &self.profiles[s]
    }

    /// The point indices of subset s, in increasing order.
    pub fn members(&self, s: SubsetIdx) -> &[PointIdx] {
        &self.members[s]
    }

    /// Whether the assignment satisfies every requirement when aggregated by group.
    pub fn satisfies(&self, assignment: &[PointCount], requirements: &[Requirement]) -> bool {
        requirements.iter().enumerate().all(|(g, &r)| {
            let covered: PointCount = assignment
                .iter()
                .enumerate()
                .filter(|(s, _)| self.profiles[*s][g])
                .map(|(_, &a)| a)
                .sum();
            covered >= r
        })
    }
}

/// Output of a [FeasibilityEnumerator].
#[derive(Debug, Clone)]
pub struct Feasibility {
    pub subset_map: SubsetMap,
    pub assignments: Vec<FeasibleAssignment>,
}

/// Produces all center-count assignments that satisfy the group requirements.
pub trait FeasibilityEnumerator {
    fn enumerate(
        &self,
        space: &Instance,
        k: PointCount,
        requirements: &[Requirement],
    ) -> Result<Feasibility, FairKMedianError>;
}

/// Enumerates all assignments in lexicographic order. A subset never receives more centers
/// than it has points.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExhaustiveEnumerator;

impl FeasibilityEnumerator for ExhaustiveEnumerator {
    fn enumerate(
        &self,
        space: &Instance,
        k: PointCount,
        requirements: &[Requirement],
    ) -> Result<Feasibility, FairKMedianError> {
        if requirements.len() != space.t() {
            return Err(FairKMedianError::InvalidDimensions(format!(
                "The instance has {} groups but {} requirements are given.",
                space.t(),
                requirements.len()
            )));
        }
        let subset_map = SubsetMap::from_instance(space);
        let mut assignments: Vec<FeasibleAssignment> = Vec::new();

        if !subset_map.is_empty() {
            let caps: Vec<PointCount> = (0..subset_map.len()).map(|s| subset_map.members(s).len()).collect();
            // suffix_cap[s] = number of points in subsets s, s+1, ...
            let mut suffix_cap = vec![0; caps.len() + 1];
            for s in (0..caps.len()).rev() {
                suffix_cap[s] = suffix_cap[s + 1] + caps[s];
            }
            let mut current: FeasibleAssignment = Vec::with_capacity(caps.len());
            extend(0, k, &caps, &suffix_cap, &mut current, &mut |a: &FeasibleAssignment| {
                if subset_map.satisfies(a, requirements) {
                    assignments.push(a.clone());
                }
            });
        }

        debug!(
            "Enumerated {} feasible assignments over {} subsets",
            assignments.len(),
            subset_map.len()
        );
        Ok(Feasibility {
            subset_map,
            assignments,
        })
    }
}

fn extend<F: FnMut(&FeasibleAssignment)>(
    s: SubsetIdx,
    remaining: PointCount,
    caps: &[PointCount],
    suffix_cap: &[PointCount],
    current: &mut FeasibleAssignment,
    visit: &mut F,
) {
    if s + 1 == caps.len() {
        if remaining <= caps[s] {
            current.push(remaining);
            visit(current);
            current.pop();
        }
        return;
    }
    for c in 0..=remaining.min(caps[s]) {
        if remaining - c > suffix_cap[s + 1] {
            continue;
        }
        current.push(c);
        extend(s + 1, remaining - c, caps, suffix_cap, current, visit);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn instance(membership: Vec<Vec<bool>>) -> Instance {
        let points = (0..membership.len()).map(|i| vec![i as f64]).collect();
        Instance::new(points, membership).unwrap()
    }

    #[test]
    fn subsets_partition_points() {
        let space = instance(vec![
            vec![true, false],
            vec![false, true],
            vec![true, false],
            vec![true, true],
            vec![false, false],
        ]);
        let map = SubsetMap::from_instance(&space);
        assert_eq!(map.len(), 4);
        // lexicographic: (f,f) < (f,t) < (t,f) < (t,t)
        assert_eq!(map.profile(0), &[false, false]);
        assert_eq!(map.members(0), &[4]);
        assert_eq!(map.members(1), &[1]);
        assert_eq!(map.members(2), &[0, 2]);
        assert_eq!(map.members(3), &[3]);

        let mut all: Vec<PointIdx> = (0..map.len()).flat_map(|s| map.members(s).to_vec()).collect();
        all.sort();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn enumerates_exactly_the_feasible_assignments() {
        // subsets: {0,1} in group 0, {2} in group 1
        let space = instance(vec![vec![true, false], vec![true, false], vec![false, true]]);
        let feasibility = ExhaustiveEnumerator.enumerate(&space, 2, &[1, 1]).unwrap();
        // subsets sorted: (f,t) = {2}, (t,f) = {0,1}
        assert_eq!(feasibility.assignments, vec![vec![1, 1]]);

        let feasibility = ExhaustiveEnumerator.enumerate(&space, 2, &[0, 0]).unwrap();
        assert_eq!(feasibility.assignments, vec![vec![0, 2], vec![1, 1]]);
    }

    #[test]
    fn infeasible_requirements_yield_no_assignment() {
        let space = instance(vec![vec![true, false], vec![true, false], vec![false, true]]);
        let feasibility = ExhaustiveEnumerator.enumerate(&space, 1, &[1, 1]).unwrap();
        assert!(feasibility.assignments.is_empty());
    }

    #[test]
    fn assignments_sum_to_k() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let n = 60;
        let t = 3;
        let membership: Vec<Vec<bool>> = (0..n).map(|_| (0..t).map(|_| rng.gen_bool(0.4)).collect()).collect();
        let space = instance(membership);
        for k in 1..5 {
            let feasibility = ExhaustiveEnumerator.enumerate(&space, k, &[1, 0, 1]).unwrap();
            for a in feasibility.assignments.iter() {
                assert_eq!(a.iter().sum::<PointCount>(), k);
                assert_eq!(a.len(), feasibility.subset_map.len());
                assert!(feasibility.subset_map.satisfies(a, &[1, 0, 1]));
                for (s, &c) in a.iter().enumerate() {
                    assert!(c <= feasibility.subset_map.members(s).len());
                }
            }
        }
    }
}
