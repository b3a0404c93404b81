//! Normalization Utilities
//!
//! Unit-scale normalization of raw priority values against per-country
//! reference bounds, with inversion for "lower is better" factors.

/// Unit-scale normalize using linear rescaling
///
/// Algorithm:
/// 1. fraction = (raw - min) / (max - min)
/// 2. Clamp to [0, 1] (values outside the bounds saturate)
/// 3. If invert = true, apply: fraction = 1 - fraction
///
/// A zero or negative range has no meaningful scale and yields 0
/// (1 when inverted).
pub fn unit_scale(raw_value: f64, min: f64, max: f64, invert: bool) -> f64 {
    let range = max - min;

    let fraction = if range > 0.0 && raw_value.is_finite() {
        ((raw_value - min) / range).clamp(0.0, 1.0)
    } else {
        0.0
    };

    if invert {
        1.0 - fraction
    } else {
        fraction
    }
}

/// Re-normalize a weighted sum by the range observed within a region
///
/// When the observed range is degenerate (every pixel has the same sum) a
/// positive sum sits at the region maximum and maps to 1; a zero sum maps to 0.
pub fn rescale_observed(value: f64, observed_min: f64, observed_max: f64) -> f64 {
    let range = observed_max - observed_min;
    if range > 0.0 {
        ((value - observed_min) / range).clamp(0.0, 1.0)
    } else if value > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_scale_bounds_map_to_endpoints() {
        for (min, max) in [(0.0, 1000.0), (-5.0, 5.0), (12.5, 13.0)] {
            assert_relative_eq!(unit_scale(min, min, max, false), 0.0, epsilon = 1e-12);
            assert_relative_eq!(unit_scale(max, min, max, false), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unit_scale_clamps_outside_bounds() {
        assert_relative_eq!(unit_scale(-10.0, 0.0, 100.0, false), 0.0);
        assert_relative_eq!(unit_scale(250.0, 0.0, 100.0, false), 1.0);
        assert_relative_eq!(unit_scale(250.0, 0.0, 100.0, true), 0.0);
    }

    #[test]
    fn test_unit_scale_inverted_distance() {
        // 250 m on a 0-1000 m scale: 1 - 0.25
        assert_relative_eq!(unit_scale(250.0, 0.0, 1000.0, true), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_unit_scale_degenerate_range() {
        assert_eq!(unit_scale(5.0, 5.0, 5.0, false), 0.0);
        assert_eq!(unit_scale(5.0, 5.0, 5.0, true), 1.0);
        assert_eq!(unit_scale(f64::NAN, 0.0, 1.0, false), 0.0);
    }

    #[test]
    fn test_rescale_observed_degenerate() {
        assert_eq!(rescale_observed(0.0, 0.0, 0.0), 0.0);
        assert_eq!(rescale_observed(3.75, 3.75, 3.75), 1.0);
        assert_relative_eq!(rescale_observed(2.0, 1.0, 3.0), 0.5);
    }
}
