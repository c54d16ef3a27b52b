//! Linear interpolation helpers for positioning within continuous controls.

/// Map `value` within `[from, to]` to a fraction where `from` is 0 and `to` is 1.
///
/// The range may run in either direction; sliders whose visual origin sits at
/// the high end of their domain pass `from > to`.
pub fn unlerp(from: f64, to: f64, value: f64) -> f64 {
    (value - from) / (to - from)
}

/// Inverse of [`unlerp`]: map a fraction back into the `[from, to]` domain.
pub fn lerp(from: f64, to: f64, fraction: f64) -> f64 {
    from + (to - from) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unlerp_maps_endpoints() {
        assert_eq!(unlerp(3.0, 6.5, 3.0), 0.0);
        assert_eq!(unlerp(3.0, 6.5, 6.5), 1.0);
    }

    #[test]
    fn unlerp_is_linear_at_midpoint() {
        assert!((unlerp(0.0, 10.0, 5.0) - 0.5).abs() < 1e-12);
        assert!((unlerp(0.0, 10.0, 2.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn unlerp_handles_descending_ranges() {
        // Vertical sliders put the high end of the domain at the top.
        let fraction = unlerp(6.5, 3.0, 5.85);
        assert!((fraction - (6.5 - 5.85) / 3.5).abs() < 1e-12);
        assert!(fraction > 0.0 && fraction < 1.0);
    }

    proptest! {
        #[test]
        fn lerp_round_trips_unlerp(
            from in -1_000.0f64..1_000.0,
            span in 0.001f64..1_000.0,
            fraction in 0.0f64..1.0,
        ) {
            let to = from + span;
            let value = lerp(from, to, fraction);
            let recovered = unlerp(from, to, value);
            prop_assert!((recovered - fraction).abs() < 1e-9);
        }
    }
}
