//! Rolling and exponential recurrences over raw `f64` slices.
//!
//! Every helper returns a vector the same length as its input, with
//! `f64::NAN` wherever the value is undefined (warm-up, or a NaN inside the
//! window). The pipeline turns NaN into an absent value at the very end.

/// Arithmetic mean over `[i - window + 1, i]`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = slice.iter().sum::<f64>() / window as f64;
    }
    result
}

/// Sample standard deviation (divisor `window - 1`) over `[i - window + 1, i]`.
///
/// Undefined for `window < 2`.
pub fn rolling_sample_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window < 2 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (window - 1) as f64;
        result[i] = variance.sqrt();
    }
    result
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded with the
/// first value rather than a simple-average window.
///
/// EMA[0] = x[0]; EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1].
/// A NaN input taints every value from that point on.
pub fn ema_seeded_first(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n == 0 || span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev = values[0];
    if prev.is_nan() {
        return result;
    }
    result[0] = prev;

    for i in 1..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean_matches_hand_computed_windows() {
        let out = rolling_mean(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 20.0, DEFAULT_EPSILON);
        assert_approx(out[3], 30.0, DEFAULT_EPSILON);
        assert_approx(out[4], 40.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_skips_windows_with_nan() {
        let out = rolling_mean(&[1.0, f64::NAN, 3.0, 4.0, 5.0], 2);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert_approx(out[3], 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_mean_short_input_is_all_nan() {
        assert!(rolling_mean(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(rolling_mean(&[], 5).is_empty());
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        // values 2, 4, 4, 4, 5, 5, 7, 9: sample variance = 32 / 7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let out = rolling_sample_std(&values, 8);
        assert_approx(out[7], (32.0_f64 / 7.0).sqrt(), 1e-12);
    }

    #[test]
    fn sample_std_undefined_for_window_one() {
        assert!(rolling_sample_std(&[1.0, 2.0, 3.0], 1)
            .iter()
            .all(|v| v.is_nan()));
    }

    #[test]
    fn ema_seeds_with_first_value() {
        // span 3 → alpha 0.5
        let out = ema_seeded_first(&[10.0, 12.0, 14.0], 3);
        assert_approx(out[0], 10.0, DEFAULT_EPSILON);
        assert_approx(out[1], 11.0, DEFAULT_EPSILON);
        assert_approx(out[2], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_taints_remainder() {
        let out = ema_seeded_first(&[10.0, f64::NAN, 14.0], 3);
        assert_approx(out[0], 10.0, DEFAULT_EPSILON);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }
}
