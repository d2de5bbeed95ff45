//! Parallel processing utilities

/// Worker count for a pool capped at `max_workers` and at the available cores
pub fn worker_count(max_workers: usize) -> usize {
    max_workers.min(num_cpus::get()).max(1)
}

/// Build a dedicated pool instead of touching rayon's global one
pub fn build_pool(max_workers: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count(max_workers))
        .thread_name(|i| format!("seqsim-worker-{}", i))
        .build()
}

/// Number of unordered pairs (i < j) among `n` items
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// All unordered pairs (i < j) in row-major order
pub fn upper_triangle_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(pair_count(n));
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}
