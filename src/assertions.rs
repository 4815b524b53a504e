use crate::error::FairKMedianError;
use crate::space::Instance;
use crate::FairKMedianProblem;

/// Checks the problem parameters on their own, i.e., without looking at the data.
///
/// # Errors
/// Returns [FairKMedianError::InvalidProblem] if k is zero or a single requirement exceeds k.
pub fn assert_problem_parameters(prob: &FairKMedianProblem) -> Result<(), FairKMedianError> {
    if prob.k < 1 {
        return Err(FairKMedianError::InvalidProblem(format!(
            "We have k = {}! There should be at least one center.",
            prob.k
        )));
    }
    for (g, &r) in prob.requirements.iter().enumerate() {
        if r > prob.k {
            return Err(FairKMedianError::InvalidProblem(format!(
                "Group {} requires {} centers, but only k = {} centers are opened.",
                g, r, prob.k
            )));
        }
    }
    Ok(())
}

/// Asserts a fair k-median problem together with its instance.
///
/// # Errors
/// * [FairKMedianError::DegenerateInput] if the instance has no points or dimension zero.
/// * [FairKMedianError::InvalidProblem] if n < k, if the problem parameters are invalid, or if a
///   group has fewer points than it requires centers.
/// * [FairKMedianError::InvalidDimensions] if the number of groups of the instance differs
///   from the length of the requirement vector.
///
/// Whether the requirements can be satisfied simultaneously is left to the feasibility
/// enumerator, as points may belong to several groups.
pub fn assert_clustering_problem(space: &Instance, prob: &FairKMedianProblem) -> Result<(), FairKMedianError> {
    if space.n() == 0 {
        return Err(FairKMedianError::DegenerateInput("The instance contains no points.".to_string()));
    }
    if space.dim() == 0 {
        return Err(FairKMedianError::DegenerateInput("The points have dimension 0.".to_string()));
    }
    assert_problem_parameters(prob)?;
    if space.n() < prob.k {
        return Err(FairKMedianError::InvalidProblem(format!(
            "We have n < k ({} < {})! We need more points than centers",
            space.n(),
            prob.k
        )));
    }
    if space.t() != prob.requirements.len() {
        return Err(FairKMedianError::InvalidDimensions(format!(
            "The instance has {} groups but {} requirements are given.",
            space.t(),
            prob.requirements.len()
        )));
    }
    for (g, &r) in prob.requirements.iter().enumerate() {
        let size = space.group_size(g);
        if size < r {
            return Err(FairKMedianError::InvalidProblem(format!(
                "There are {} points of group {}, but we require r = {} of the centers to be of this group.",
                size, g, r
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_instance() -> Instance {
        Instance::new(
            vec![vec![0.0], vec![1.0], vec![2.0]],
            vec![vec![true, false], vec![false, true], vec![false, true]],
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_problem() {
        let prob = FairKMedianProblem { k: 2, requirements: vec![1, 1] };
        assert!(assert_clustering_problem(&small_instance(), &prob).is_ok());
    }

    #[test]
    fn rejects_zero_k() {
        let prob = FairKMedianProblem { k: 0, requirements: vec![0, 0] };
        assert!(matches!(
            assert_clustering_problem(&small_instance(), &prob),
            Err(FairKMedianError::InvalidProblem(_))
        ));
    }

    #[test]
    fn rejects_requirement_larger_than_group() {
        let prob = FairKMedianProblem { k: 2, requirements: vec![2, 0] };
        assert!(matches!(
            assert_clustering_problem(&small_instance(), &prob),
            Err(FairKMedianError::InvalidProblem(_))
        ));
    }

    #[test]
    fn rejects_wrong_number_of_requirements() {
        let prob = FairKMedianProblem { k: 2, requirements: vec![1] };
        assert!(matches!(
            assert_clustering_problem(&small_instance(), &prob),
            Err(FairKMedianError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn rejects_empty_instance() {
        let space = Instance::new(vec![], vec![]).unwrap();
        let prob = FairKMedianProblem { k: 1, requirements: vec![] };
        assert!(matches!(
            assert_clustering_problem(&space, &prob),
            Err(FairKMedianError::DegenerateInput(_))
        ));
    }
}
