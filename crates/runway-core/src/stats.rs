//! Small statistics helpers shared by the analyzers

/// Arithmetic mean, 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator), 0.0 with fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Coefficient of variation (stddev / |mean|)
///
/// Returns None when the mean is zero, since the ratio is undefined.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values);
    if values.is_empty() || m.abs() < f64::EPSILON {
        return None;
    }
    Some(std_dev(values) / m.abs())
}

/// Linear-interpolated percentile (0-100) of an already sorted slice
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        sorted[lower] * (1.0 - w) + sorted[upper] * w
    }
}

/// Two-sided critical value for a confidence level
///
/// Fixed normal-approximation lookup rather than a Student-t quantile.
pub fn critical_value(confidence_level: f64) -> f64 {
    match confidence_level {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        _ => 1.96,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(mean(&values), 5.0);
        assert_approx(std_dev(&values), 2.0);
        assert_approx(sample_variance(&values), 32.0 / 7.0);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(sample_variance(&[3.0]), 0.0);
    }

    #[test]
    fn test_coefficient_of_variation() {
        assert_eq!(coefficient_of_variation(&[10.0, 10.0, 10.0]), Some(0.0));
        assert!(coefficient_of_variation(&[1.0, -1.0]).is_none());
        assert!(coefficient_of_variation(&[]).is_none());
    }

    #[test]
    fn test_percentile_interpolates_between_points() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_approx(percentile_sorted(&values, 25.0), 1.75);
        assert_approx(percentile_sorted(&values, 0.0), 1.0);
        assert_approx(percentile_sorted(&values, 100.0), 4.0);
    }

    #[test]
    fn test_critical_value_lookup() {
        assert_eq!(critical_value(0.90), 1.645);
        assert_eq!(critical_value(0.95), 1.96);
        assert_eq!(critical_value(0.99), 2.576);
    }
}
