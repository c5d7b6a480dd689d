//! Summary Statistics
//!
//! Reductions over per-batch throughput samples.
//!
//! The standard deviation divides by `n`, not `n - 1`. It is reported as a
//! coarse noise indicator for a short run, never used for inference.

/// Arithmetic mean of `samples`.
///
/// Returns `0.0` for an empty slice instead of NaN.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Standard deviation of `samples`, dividing by `n`.
///
/// Empty and single-sample input yield `0.0`.
pub fn stddev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let m = mean(samples);
    let variance = samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

/// Summary of a sample set
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Arithmetic mean
    pub mean: f64,
    /// Standard deviation (divide by `n`)
    pub std_dev: f64,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Number of samples
    pub sample_count: usize,
}

/// Compute a [`Summary`] over `samples`. An empty slice gives all zeroes.
pub fn compute_summary(samples: &[f64]) -> Summary {
    if samples.is_empty() {
        return Summary::default();
    }

    let min = samples
        .iter()
        .copied()
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(0.0);
    let max = samples
        .iter()
        .copied()
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(0.0);

    Summary {
        mean: mean(samples),
        std_dev: stddev(samples),
        min,
        max,
        sample_count: samples.len(),
    }
}

impl Summary {
    /// Coefficient of variation (relative stddev, percent)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.std_dev / self.mean) * 100.0
        }
    }

    /// Check if the samples look stable (CV below `cv_threshold` percent)
    pub fn is_stable(&self, cv_threshold: f64) -> bool {
        self.coefficient_of_variation() < cv_threshold
    }
}
