//! Latency percentile helpers.

/// p95 of the samples, 0 when there are none.
///
/// Samples are sorted ascending and the element at `ceil(0.95 * n) - 1`
/// is selected, so ten samples `10..=100` yield `90` (the ninth smallest),
/// two samples yield the larger one and a single sample is its own p95.
pub fn p95(samples: &[u64]) -> u64 {
    percentile(samples, 0.95)
}

/// Nearest-rank percentile at index `ceil(q * n) - 1`, `q` clamped to `[0, 1]`.
pub fn percentile(samples: &[u64], q: f64) -> u64 {
    if samples.is_empty() {
        return 0;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let n = sorted.len();
    let rank = (q.clamp(0.0, 1.0) * n as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(n - 1)]
}
