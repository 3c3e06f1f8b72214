//! Histogram binning of sample proportions and histogram entropy.
//!
//! Bins are `[0, w], (w, 2w], ..., ((n-1)w, 1]` with `w = 1 / n`: the lowest
//! bin is closed on both ends so that absent mutations (proportion 0) have a
//! home, every other bin is open on the low end.

use crate::model::EntropyBase;

/// Bins proportions in `[0, 1]` into `num_bins` equal-width bins.
///
/// # Arguments
///
/// * `proportions` - Sample proportions to bin.
/// * `num_bins` - Number of bins.
///
/// # Returns
///
/// Counts per bin, of length `num_bins`. Empty if `proportions` is empty or `num_bins` is 0.
///
/// A bin count above the sample size of the underlying population gives empty
/// bins between frequency steps, it is not rejected.
pub fn bin_proportions(proportions: &[f64], num_bins: usize) -> Vec<usize> {
    if proportions.is_empty() || num_bins == 0 {
        return Vec::new();
    }

    let mut bins = vec![0; num_bins];
    for &proportion in proportions {
        bins[bin_index(proportion, num_bins)] += 1;
    }
    bins
}

/// Bin of a single proportion, `ceil(p * n) - 1` clamped to `[0, n - 1]`.
fn bin_index(proportion: f64, num_bins: usize) -> usize {
    if proportion <= 0.0 {
        return 0;
    }
    // Multiplying instead of dividing by a rounded width keeps 0.9 * 10 == 9
    let upper = (proportion * num_bins as f64).ceil() as usize;
    upper.saturating_sub(1).min(num_bins - 1)
}

/// Shannon entropy of a histogram, `-sum(p_i * log(p_i))` over non-empty bins.
///
/// Returns 0 for histograms with at most one bin, or holding at most one observation.
pub fn entropy(histogram: &[usize], base: EntropyBase) -> f64 {
    let total: usize = histogram.iter().sum();
    if histogram.len() <= 1 || total <= 1 {
        return 0.0;
    }

    let total = total as f64;
    let sum: f64 = histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            p * base.log(p)
        })
        .sum();
    -sum
}

/// Entropy in natural-log units.
pub fn standard_entropy(histogram: &[usize]) -> f64 {
    entropy(histogram, EntropyBase::Nats)
}
