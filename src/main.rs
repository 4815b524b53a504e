extern crate fair_k_median;

use std::io::stdout;
use std::process::ExitCode;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fair_k_median::generator::{get_feasible_instance, make_blobs};
use fair_k_median::space::Instance;
use fair_k_median::{compute_fair_k_median, Collaborators, FairKMedianError, FairKMedianProblem, OptionalParameters};

fn test_es_fpt_complete() -> Result<(), FairKMedianError> {
    // random number generator seeds
    let gen_seed = 12312321;
    let sampling_seed = rand::random::<u64>();

    let n = 100;
    let t = 3;
    let k = 3;
    let d = 2;
    let r_max = 3;
    let r_min = 1;
    let max_freq = 3;

    let (data, _) = make_blobs(n, k, d, 0.8, 12312)?;

    // generate instance and time it
    let time_buf = Instant::now();
    let (color_mat, rvec) = get_feasible_instance(t, n, r_max, r_min, max_freq, k, gen_seed, false)?;
    info!(
        "Generated instance with requirements {:?} in {:.3}s",
        rvec,
        time_buf.elapsed().as_secs_f64()
    );

    let space = Instance::new(data, color_mat)?;
    let prob = FairKMedianProblem { k, requirements: rvec };
    let params = OptionalParameters::default().with_seed(sampling_seed);
    info!("Sampling seed: {}", sampling_seed);

    let mut logfile = stdout();
    compute_fair_k_median(&space, &prob, &params, &Collaborators::with_parameters(&params), &mut logfile)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(stdout)
        .init();

    match test_es_fpt_complete() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
