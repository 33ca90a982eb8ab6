//! Log-space arithmetic in base 10.

/// Helper function to convert usize count to f64 with explicit precision loss allowance
#[inline]
pub fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Calculates *log10(sum(10^values))*.
///
/// Returns negative infinity for an empty slice or when all values are negative infinity.
#[must_use]
pub fn log10_sum_log10(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|v| 10f64.powf(v - max)).sum();
    max + sum.log10()
}

/// Shift a log10 vector so that its largest element is zero.
#[must_use]
pub fn shift_to_max_zero<const N: usize>(values: [f64; N]) -> [f64; N] {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return values;
    }
    values.map(|v| v - max)
}

/// Normalize a log10 vector into linear probabilities summing to one.
#[must_use]
pub fn log10_to_probabilities<const N: usize>(values: [f64; N]) -> [f64; N] {
    let total = log10_sum_log10(&values);
    if !total.is_finite() {
        return [1.0 / count_to_f64(N); N];
    }
    values.map(|v| 10f64.powf(v - total))
}

/// Convert a phred-scaled quality into an error probability.
#[must_use]
pub fn phred_to_error_probability(quality: u8) -> f64 {
    10f64.powf(-f64::from(quality) / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log10_sum_log10() {
        let v = log10_sum_log10(&[-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0]);
        assert!(v.abs() < 1e-12);
        assert_eq!(log10_sum_log10(&[]), f64::NEG_INFINITY);
        assert_eq!(
            log10_sum_log10(&[f64::NEG_INFINITY, f64::NEG_INFINITY]),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_log10_sum_handles_large_magnitudes() {
        let v = log10_sum_log10(&[-400.0, -400.0]);
        assert!((v - (-400.0 + 2f64.log10())).abs() < 1e-9);
    }

    #[test]
    fn test_shift_to_max_zero() {
        let shifted = shift_to_max_zero([-3.0, -1.0, -2.0]);
        assert_eq!(shifted, [-2.0, 0.0, -1.0]);
    }

    #[test]
    fn test_log10_to_probabilities() {
        let probs = log10_to_probabilities([0.0, 0.0, f64::NEG_INFINITY]);
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
        assert!(probs[2].abs() < 1e-12);
    }

    #[test]
    fn test_phred_to_error_probability() {
        assert!((phred_to_error_probability(10) - 0.1).abs() < 1e-12);
        assert!((phred_to_error_probability(30) - 0.001).abs() < 1e-12);
        assert!((phred_to_error_probability(0) - 1.0).abs() < 1e-12);
    }
}
