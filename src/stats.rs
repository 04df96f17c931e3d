//! Descriptive statistics and confidence intervals for timing series.
//!
//! Degenerate inputs are absorbed rather than raised:
//! - fewer than 2 samples: `stdev = 0` and a `(0, 0)` interval
//! - fewer than [`PERCENTILE_MIN_SAMPLES`]: percentiles are `None`

use serde::Serialize;

/// Minimum number of samples before percentiles are reported
pub const PERCENTILE_MIN_SAMPLES: usize = 20;

/// Confidence level of [`confidence_interval`]
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Summary of one timing series. All times are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 below two samples
    pub stdev: f64,
    pub median: f64,
    /// `None` below [`PERCENTILE_MIN_SAMPLES`]
    pub percentile_5: Option<f64>,
    /// `None` below [`PERCENTILE_MIN_SAMPLES`]
    pub percentile_95: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Bounds for the true mean at [`level`](Self::level) confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Compute descriptive statistics. Returns `None` for an empty series.
pub fn describe(samples: &[f64]) -> Option<DescriptiveStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = mean(samples);
    let (percentile_5, percentile_95) = if sorted.len() >= PERCENTILE_MIN_SAMPLES {
        (
            Some(percentile_exclusive(&sorted, 5)),
            Some(percentile_exclusive(&sorted, 95)),
        )
    } else {
        (None, None)
    };

    Some(DescriptiveStats {
        mean,
        stdev: std_dev(samples, mean),
        median: median(&sorted),
        percentile_5,
        percentile_95,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        count: samples.len(),
    })
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation around `mean`
pub fn std_dev(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let variance = samples
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt()
}

/// Median of an already sorted slice; averages the middle pair for even
/// lengths.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// The `k`-th of the 99 cut points splitting `sorted` into 100 groups.
///
/// Uses the exclusive method: positions are scaled by `n + 1`, clamped to
/// the interior order statistics and linearly interpolated.
pub fn percentile_exclusive(sorted: &[f64], k: usize) -> f64 {
    const GROUPS: i64 = 100;
    let n = sorted.len();
    match n {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }

    let k = k as i64;
    let m = n as i64 + 1;
    let j = (k * m / GROUPS).clamp(1, n as i64 - 1);
    let delta = k * m - j * GROUPS;

    let lo = sorted[j as usize - 1];
    let hi = sorted[j as usize];
    let value = (lo * (GROUPS - delta) as f64 + hi * delta as f64) / GROUPS as f64;
    if (0..=GROUPS).contains(&delta) {
        value.clamp(lo, hi)
    } else {
        value
    }
}

/// Two-tailed 95% critical value for `n` samples.
///
/// Exact Student-t values for 2..=10 samples, 2.0 up to 30 and the normal
/// approximation above.
pub fn t_critical_95(n: usize) -> f64 {
    if n > 30 {
        return 1.96;
    }
    match n {
        2 => 12.71,
        3 => 4.30,
        4 => 3.18,
        5 => 2.78,
        6 => 2.57,
        7 => 2.45,
        8 => 2.36,
        9 => 2.31,
        10 => 2.26,
        _ => 2.0,
    }
}

/// 95% confidence interval for the mean; `(0, 0)` below two samples.
pub fn confidence_interval(samples: &[f64]) -> ConfidenceInterval {
    let n = samples.len();
    if n < 2 {
        return ConfidenceInterval {
            lower: 0.0,
            upper: 0.0,
            level: CONFIDENCE_LEVEL,
        };
    }
    let mean = mean(samples);
    let margin = t_critical_95(n) * std_dev(samples, mean) / (n as f64).sqrt();
    ConfidenceInterval {
        lower: mean - margin,
        upper: mean + margin,
        level: CONFIDENCE_LEVEL,
    }
}
