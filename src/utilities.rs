use rayon::ThreadPoolBuilder;
use tracing::warn;

/// Runs op inside a rayon pool of thread_count threads. If the pool cannot be built, op runs in
/// the global pool instead.
pub(crate) fn with_thread_pool<R, F>(thread_count: usize, op: F) -> R
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match ThreadPoolBuilder::new().num_threads(thread_count.max(1)).build() {
        Ok(thread_pool) => thread_pool.install(op),
        Err(error) => {
            warn!("Cannot build thread pool with {} threads: {}", thread_count, error);
            op()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn pool_runs_closure() {
        let sum: u64 = with_thread_pool(2, || (0..1000u64).into_par_iter().sum());
        assert_eq!(sum, 499_500);
    }
}
