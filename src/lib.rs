//! Fair k-median clustering with lower bounds on the number of centers per group.
//!
//! All center-count assignments that satisfy the group requirements are enumerated, a tiered
//! random sample of them is expanded into partitions, and each partition is solved on a coreset
//! by an FPT (3 + eps)-approximation. The best solution is chosen by its true cost on the full
//! instance.
//!
//! ```rust
//! use fair_k_median::{compute_fair_k_median, Collaborators, FairKMedianProblem, OptionalParameters};
//! use fair_k_median::space::Instance;
//!
//! let points = vec![vec![0.0], vec![0.5], vec![10.0], vec![10.5]];
//! let membership = vec![vec![true, false], vec![false, true], vec![true, false], vec![false, true]];
//! let space = Instance::new(points, membership).unwrap();
//! let prob = FairKMedianProblem { k: 2, requirements: vec![1, 1] };
//! let params = OptionalParameters::default().with_seed(3).with_coreset_fraction(1.0);
//!
//! let mut log: Vec<u8> = Vec::new();
//! let stats = compute_fair_k_median(&space, &prob, &params, &Collaborators::with_parameters(&params), &mut log).unwrap();
//! assert_eq!(stats.best_centers.m(), 2);
//! assert!(stats.cost >= 0.0);
//! ```

use std::io::Write;
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

pub mod types;
pub use types::{Cost, DurationInSec, GroupCount, PointCount, Requirement};

pub mod error;
pub use error::FairKMedianError;

pub mod space;
use space::Instance;

mod assertions;
pub use assertions::{assert_clustering_problem, assert_problem_parameters};

pub mod clustering;
use clustering::Centers;

mod gonzales;
mod utilities;

pub mod baseline;
pub mod binning;
pub mod coreset;
pub mod evaluation;
pub mod feasibility;
pub mod generator;
pub mod partition;
pub mod sampler;
pub mod solver;
pub mod stats;

use baseline::{BaselineComparator, SwapLocalSearch};
use binning::{DistanceBinner, GeometricBinner};
use coreset::{CoresetBuilder, SensitivityCoreset};
use evaluation::{true_cost, RunningMinimum};
use feasibility::{ExhaustiveEnumerator, FeasibilityEnumerator, FeasibleAssignment};
use partition::Partition;
use sampler::{sample_candidates, Threshold};
use solver::{LeaderGuessSolver, PartitionSolver};
use stats::{probe_memory, ProcStatusProbe, ResourceProbe, RunStats};

/// A fair k-median problem: open k centers such that for every group g at least
/// requirements[g] centers belong to g.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FairKMedianProblem {
    pub k: PointCount,                  // number of centers
    pub requirements: Vec<Requirement>, // lower bound on the centers of each group
}

/// Optional parameters of a run.
#[derive(Debug, Clone)]
pub struct OptionalParameters {
    /// Seed of the random source used for sampling and coreset construction.
    pub seed: u64,
    /// Size of the coreset as a fraction of the number of points.
    pub coreset_fraction: f64,
    /// Distances are binned in powers of (1 + epsilon).
    pub epsilon: f64,
    /// Number of threads for the data-parallel parts (cost evaluation, binning, local search).
    pub thread_count: usize,
    /// Lower bound on the number of sampled assignments when there is at least one.
    pub min_threshold: PointCount,
}

impl Default for OptionalParameters {
    fn default() -> Self {
        OptionalParameters {
            seed: 0,
            coreset_fraction: 0.2,
            epsilon: 0.1,
            thread_count: num_cpus::get(),
            min_threshold: 1,
        }
    }
}

impl OptionalParameters {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_coreset_fraction(mut self, coreset_fraction: f64) -> Self {
        self.coreset_fraction = coreset_fraction;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Setting this to 0 turns a zero threshold into [FairKMedianError::NoCandidateSampled].
    pub fn with_min_threshold(mut self, min_threshold: PointCount) -> Self {
        self.min_threshold = min_threshold;
        self
    }
}

/// The heavy algorithms a run delegates to. All of them can be replaced.
pub struct Collaborators {
    pub enumerator: Box<dyn FeasibilityEnumerator>,
    pub coreset_builder: Box<dyn CoresetBuilder>,
    pub binner: Box<dyn DistanceBinner>,
    pub solver: Box<dyn PartitionSolver>,
    pub baseline: Box<dyn BaselineComparator>,
    pub probe: Box<dyn ResourceProbe>,
}

impl Collaborators {
    /// The default collaborators, configured by params.
    pub fn with_parameters(params: &OptionalParameters) -> Collaborators {
        Collaborators {
            enumerator: Box::new(ExhaustiveEnumerator),
            coreset_builder: Box::new(SensitivityCoreset),
            binner: Box::new(GeometricBinner {
                epsilon: params.epsilon,
                thread_count: params.thread_count,
            }),
            solver: Box::new(LeaderGuessSolver),
            baseline: Box::new(SwapLocalSearch {
                thread_count: params.thread_count,
                ..SwapLocalSearch::default()
            }),
            probe: Box::new(ProcStatusProbe),
        }
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Collaborators::with_parameters(&OptionalParameters::default())
    }
}

/// Checks that the solver returned exactly k finite centers of the right dimension.
fn centers_from_solver(
    approx_cost: Cost,
    rows: &[Vec<f64>],
    k: PointCount,
    dim: usize,
) -> Result<Centers, FairKMedianError> {
    if rows.len() != k {
        return Err(FairKMedianError::SolverContractViolation(format!(
            "returned {} centers, expected k = {}",
            rows.len(),
            k
        )));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != dim) {
        return Err(FairKMedianError::SolverContractViolation(format!(
            "center {} has dimension {}, expected {}",
            i,
            row.len(),
            dim
        )));
    }
    if rows.iter().flatten().any(|x| !x.is_finite()) {
        return Err(FairKMedianError::SolverContractViolation(
            "returned a center with non-finite coordinates".to_string(),
        ));
    }
    if !approx_cost.is_finite() || approx_cost < 0.0 {
        return Err(FairKMedianError::SolverContractViolation(format!(
            "returned cost {}",
            approx_cost
        )));
    }
    Centers::from_rows(rows, dim)
}

/// Computes a fair k-median solution.
///
/// The feasible center-count assignments are enumerated, a coreset with binned distances is
/// built once, and a tiered random sample of the assignments is solved partition by partition.
/// Every solution is evaluated on the full instance; the best one is returned with the statistics
/// of the run. One summary line is written to logfile.
///
/// # Errors
/// * [FairKMedianError::InfeasibleInstance] if no assignment satisfies the requirements.
/// * [FairKMedianError::NoCandidateSampled] if the threshold is 0 although assignments exist.
/// * [FairKMedianError::SolverContractViolation] if the solver does not return k proper centers.
/// * [FairKMedianError::InvalidProblem], [FairKMedianError::InvalidDimensions] and
///   [FairKMedianError::DegenerateInput] for malformed input.
pub fn compute_fair_k_median(
    space: &Instance,
    prob: &FairKMedianProblem,
    params: &OptionalParameters,
    collaborators: &Collaborators,
    logfile: &mut dyn Write,
) -> Result<RunStats, FairKMedianError> {
    assert_clustering_problem(space, prob)?;
    let k = prob.k;

    let tstart = Instant::now();

    //////////////////////////////////////////////////////////
    // phase 1: enumerate all feasible center-count vectors //
    //////////////////////////////////////////////////////////

    let time_buf = Instant::now();
    let feasibility = collaborators.enumerator.enumerate(space, k, &prob.requirements)?;
    let feasibility_time = time_buf.elapsed().as_secs_f64();
    let nof_solutions = feasibility.assignments.len();
    info!(
        "** Phase 1: Enumerated {} feasible assignments over {} subsets in {:.3}s",
        nof_solutions,
        feasibility.subset_map.len(),
        feasibility_time
    );
    if nof_solutions == 0 {
        return Err(FairKMedianError::InfeasibleInstance);
    }

    ///////////////////////////////////////////
    // phase 2: coreset and binned distances //
    ///////////////////////////////////////////

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let time_buf = Instant::now();
    let coreset = collaborators
        .coreset_builder
        .build(space, k, params.coreset_fraction, &mut rng)?;
    if coreset.is_empty() {
        return Err(FairKMedianError::DegenerateInput("The coreset is empty.".to_string()));
    }
    let binned = collaborators.binner.bin(space, &coreset, k)?;
    let coreset_time = time_buf.elapsed().as_secs_f64();
    info!(
        "** Phase 2: Built coreset of {} points and {} distance bins in {:.3}s",
        coreset.len(),
        binned.bins().len(),
        coreset_time
    );

    //////////////////////////////////////////////////////
    // phase 3: sample assignments and solve partitions //
    //////////////////////////////////////////////////////

    let threshold = Threshold::for_pool(nof_solutions, params.min_threshold);
    if threshold.value == 0 {
        return Err(FairKMedianError::NoCandidateSampled { nof_solutions });
    }
    if threshold.raised() {
        warn!(
            "Tiered threshold for {} feasible assignments is {}; sampling {} instead",
            nof_solutions, threshold.tiered, threshold.value
        );
    }
    let sample = sample_candidates(&feasibility.assignments, threshold.value, &mut rng);

    let time_buf = Instant::now();
    let mut best: RunningMinimum<(FeasibleAssignment, Centers)> = RunningMinimum::new();
    for (x, s) in sample.iter().enumerate() {
        let time_eps = Instant::now();
        let partition = Partition::expand(s, &feasibility.subset_map, k)?;
        let (approx_cost, rows) = collaborators
            .solver
            .solve(&partition, space, &coreset, &binned, k)?;
        let centers = centers_from_solver(approx_cost, &rows, k, space.dim())?;
        let actual_cost = true_cost(space, &centers, params.thread_count)?;
        best.fold(actual_cost, (s.to_vec(), centers));
        info!(
            "{} / {} : {:?} : {} {:.4}s",
            x,
            threshold.value,
            s,
            best.best().unwrap_or(actual_cost),
            time_eps.elapsed().as_secs_f64()
        );
    }
    let fpt_3apx_time = time_buf.elapsed().as_secs_f64();
    let total_time = tstart.elapsed().as_secs_f64();
    let memory = probe_memory(collaborators.probe.as_ref());

    let (cost, (best_assignment, best_centers)) = best.into_inner().ok_or(FairKMedianError::NoCandidateSampled {
        nof_solutions,
    })?;

    let opt_ls_cost = collaborators.baseline.baseline_cost(space, k)?;
    info!(
        "** Phase 3: Best cost {:.6} (unconstrained local search: {:.6}) after {} candidates in {:.3}s",
        cost,
        opt_ls_cost,
        threshold.value,
        fpt_3apx_time
    );

    let stats = RunStats {
        feasibility_time,
        coreset_time,
        fpt_3apx_time,
        total_time,
        memory,
        nof_solutions,
        threshold: threshold.value,
        threshold_raised: threshold.raised(),
        cost,
        opt_ls_cost,
        best_assignment,
        best_centers,
    };
    if let Err(error) = stats.report(logfile) {
        warn!("Cannot write the summary line: {}", error);
    }
    Ok(stats)
}
