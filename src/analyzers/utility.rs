/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
///
/// Falls back to summing `x / n` when the plain sum overflows.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

/// Computes the median of a slice of values. Returns 0.0 for empty input.
///
/// For an even number of values the two middle elements are averaged.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
    } else {
        sorted[mid]
    }
}

/// Computes the population variance (divisor `n`) given a pre-computed mean.
/// Returns 0.0 when fewer than two values are present.
pub fn variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 when fewer than two values are present.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    variance(values, mean).sqrt()
}

/// Difference between the largest and smallest value. Returns 0.0 for empty input.
pub fn range(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max - min
}

/// Standard deviation as a percentage of the mean. Returns 0.0 when the mean is 0
/// or when either input (or the ratio) is not finite.
pub fn coefficient_of_variation(stddev: f64, mean: f64) -> f64 {
    if mean == 0.0 || !mean.is_finite() || !stddev.is_finite() {
        return 0.0;
    }
    let cv = (stddev / mean) * 100.0;
    if cv.is_finite() { cv } else { 0.0 }
}
