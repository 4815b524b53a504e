use thiserror::Error;

/// Error types of a fair k-median run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FairKMedianError {
    /// k, the requirement vector or the membership matrix are inconsistent.
    #[error("Invalid clustering problem: {0}")]
    InvalidProblem(String),

    /// Point rows, membership rows or center rows do not have the expected width.
    #[error("Dimension mismatch: {0}")]
    InvalidDimensions(String),

    /// The enumerator found no center-count assignment satisfying the requirements.
    #[error("No feasible solution: no center-count assignment satisfies the group requirements")]
    InfeasibleInstance,

    /// Feasible assignments exist, but the sampling threshold selected none of them.
    #[error("No candidate sampled: the threshold is 0 for {nof_solutions} feasible assignments")]
    NoCandidateSampled { nof_solutions: usize },

    /// Empty point set, empty coreset or empty candidate pool.
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// The partition solver returned something other than k well-formed centers.
    #[error("Partition solver contract violated: {0}")]
    SolverContractViolation(String),

    /// Process memory could not be inspected. Never fatal for a run.
    #[error("Resource probe unavailable: {0}")]
    ResourceProbeUnavailable(String),
}
