//! Range limiting for scalar and per-sample quantities.

/// Limits `value` to `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: when `min > max` the upper bound
/// wins, and a NaN `value` comes out as `min`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    max.min(min.max(value))
}

/// Applies [`clamp`] to every sample.
pub fn clamp_series(values: &[f64], min: f64, max: f64) -> Vec<f64> {
    values.iter().map(|&v| clamp(v, min, max)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_inside_range_is_unchanged() {
        assert_eq!(clamp(3.0, 0.0, 5.0), 3.0);
    }

    #[test]
    fn scalar_is_limited_on_both_sides() {
        assert_eq!(clamp(-1.0, 0.0, 5.0), 0.0);
        assert_eq!(clamp(7.0, 0.0, 5.0), 5.0);
    }

    #[test]
    fn degenerate_range_collapses_to_point() {
        assert_eq!(clamp(10.0, 0.0, 0.0), 0.0);
        assert_eq!(clamp(-10.0, -0.0, 0.0), 0.0);
    }

    #[test]
    fn nan_maps_to_lower_bound() {
        assert_eq!(clamp(f64::NAN, -2.0, 2.0), -2.0);
    }

    #[test]
    fn series_is_limited_elementwise() {
        let out = clamp_series(&[-300.0, -50.0, 0.0, 20.0], -100.0, 0.0);
        assert_eq!(out, vec![-100.0, -50.0, 0.0, 0.0]);
    }
}
