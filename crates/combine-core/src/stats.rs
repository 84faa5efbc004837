// Descriptive statistics over roster-wide metric samples.
//
// Callers filter out missing values before calling in; the percentile
// functions additionally expect their input sorted ascending, so a metric's
// sample is sorted once per roster rather than once per athlete.

use std::cmp::Ordering;

/// Threshold below which standard deviation is treated as zero.
pub const STDEV_EPSILON: f64 = 1e-9;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Optional-aware variant of [`round_to`].
pub fn round_opt(value: Option<f64>, decimals: u32) -> Option<f64> {
    value.map(|v| round_to(v, decimals))
}

/// Collect the present, finite values out of an optional sample.
pub fn present<I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Sort a sample ascending. NaN never reaches here (see [`present`]).
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    values
}

/// Arithmetic mean. `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns `None` when fewer than two values are present: a single
/// observation has no spread to speak of.
pub fn stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Mid-rank percentile of `value` within an ascending `sorted` sample.
///
/// `percentile = round(100 * (below + (equal - 1) / 2) / (n - 1))`, so tied
/// values share one percentile. A lone data point sits at 50. Returns `None`
/// for an empty sample.
pub fn percentile_of(value: f64, sorted: &[f64]) -> Option<u8> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(50);
    }
    let below = sorted.partition_point(|v| *v < value);
    let through = sorted.partition_point(|v| *v <= value);
    let equal = through - below;

    let rank = below as f64 + (equal as f64 - 1.0) / 2.0;
    let pct = (100.0 * rank / (n - 1) as f64).round();
    Some(pct.clamp(0.0, 100.0) as u8)
}

/// Value at percentile `p` (0-100) of an ascending `sorted` sample, linearly
/// interpolated between neighbouring ranks and rounded to one decimal.
pub fn percentile_value(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let idx = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    let frac = idx - lo as f64;
    let value = sorted[lo] + (sorted[hi] - sorted[lo]) * frac;
    Some(round_to(value, 1))
}

/// Standardize `value` against a sample mean and standard deviation.
///
/// Returns 0.0 when the spread is effectively zero (every athlete tied).
pub fn zscore(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev < STDEV_EPSILON {
        return 0.0;
    }
    (value - mean) / stddev
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn round_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(6.416_842, 3), 6.417);
        assert_eq!(round_to(81.646_627, 2), 81.65);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[4.0]), Some(4.0));
    }

    #[test]
    fn stddev_is_bessel_corrected() {
        // [2, 4, 4, 4, 5, 5, 7, 9]: population sd = 2, sample sd = sqrt(32/7)
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = stddev(&values).unwrap();
        assert!(approx_eq(sd, (32.0_f64 / 7.0).sqrt(), 1e-12));
    }

    #[test]
    fn stddev_needs_two_values() {
        assert_eq!(stddev(&[]), None);
        assert_eq!(stddev(&[3.0]), None);
        assert_eq!(stddev(&[3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn present_drops_missing_and_non_finite() {
        let values = present(vec![Some(1.0), None, Some(f64::NAN), Some(2.5)]);
        assert_eq!(values, vec![1.0, 2.5]);
    }

    #[test]
    fn percentile_of_singleton_is_fifty() {
        assert_eq!(percentile_of(123.0, &[123.0]), Some(50));
    }

    #[test]
    fn percentile_of_extremes() {
        let s = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile_of(10.0, &s), Some(0));
        assert_eq!(percentile_of(30.0, &s), Some(50));
        assert_eq!(percentile_of(50.0, &s), Some(100));
    }

    #[test]
    fn percentile_of_ties_share_mid_rank() {
        // below = 1, equal = 2 -> rank 1.5 of 3 -> 50
        let s = [10.0, 20.0, 20.0, 30.0];
        assert_eq!(percentile_of(20.0, &s), Some(50));
        // all tied -> rank (n-1)/2 -> 50
        assert_eq!(percentile_of(5.0, &[5.0, 5.0, 5.0]), Some(50));
    }

    #[test]
    fn percentile_of_empty_is_none() {
        assert_eq!(percentile_of(1.0, &[]), None);
    }

    #[test]
    fn percentile_value_interpolates() {
        let s = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile_value(&s, 50.0), Some(30.0));
        assert_eq!(percentile_value(&s, 10.0), Some(14.0));
        assert_eq!(percentile_value(&s, 90.0), Some(46.0));
        assert_eq!(percentile_value(&s, 0.0), Some(10.0));
        assert_eq!(percentile_value(&s, 100.0), Some(50.0));
        assert_eq!(percentile_value(&[], 50.0), None);
    }

    #[test]
    fn percentile_value_rounds_to_one_decimal() {
        let s = [1.0, 2.0, 4.0];
        // idx = 0.25 * 2 = 0.5 -> 1.5
        assert_eq!(percentile_value(&s, 25.0), Some(1.5));
        // idx = 0.33 * 2 = 0.66 -> 1.66 -> 1.7
        assert_eq!(percentile_value(&s, 33.0), Some(1.7));
    }

    #[test]
    fn zscore_zero_spread_is_zero() {
        assert_eq!(zscore(5.0, 5.0, 0.0), 0.0);
        assert!(approx_eq(zscore(7.0, 5.0, 2.0), 1.0, 1e-12));
    }
}
