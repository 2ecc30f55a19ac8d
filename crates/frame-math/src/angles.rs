//! Angle wraparound and limit helpers
//!
//! Every servo axis is stored wrapped to (−π, π]. Limits are per-axis and only
//! active when the bound itself lies inside [−π, π]; anything outside means
//! "unlimited" on that side.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Gimbal axis index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Azimuth = 0,
    Elevation = 1,
    Roll = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Azimuth, Axis::Elevation, Axis::Roll];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Wrap radians to (−π, π]
pub fn wrap_rad(a: f64) -> f64 {
    if !a.is_finite() {
        return a;
    }
    let r = a.rem_euclid(TAU);
    if r > PI {
        r - TAU
    } else {
        r
    }
}

/// Wrap degrees to (−180, 180]
pub fn wrap_deg(a: f64) -> f64 {
    if !a.is_finite() {
        return a;
    }
    let r = a.rem_euclid(360.0);
    if r > 180.0 {
        r - 360.0
    } else {
        r
    }
}

/// Wrap degrees to [0, 360)
pub fn wrap_360(a: f64) -> f64 {
    if !a.is_finite() {
        return a;
    }
    let r = a.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negatives
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Shortest signed angular distance `a − b`, wrapped
pub fn angle_diff_rad(a: f64, b: f64) -> f64 {
    wrap_rad(a - b)
}

/// A bound is active iff it lies within [−π, π] (boundary inclusive)
pub fn limit_active(bound: f64) -> bool {
    (-PI..=PI).contains(&bound)
}

/// Clamp a wrapped angle against its low/high bounds.
///
/// The high bound is checked first; when both are violated (inverted limits)
/// the high bound wins. Returns the clamped angle and whether a clamp happened.
pub fn clamp_to_limits(angle: f64, low: f64, high: f64) -> (f64, bool) {
    if limit_active(high) && angle > high {
        (high, true)
    } else if limit_active(low) && angle < low {
        (low, true)
    } else {
        (angle, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_wrap_rad_range() {
        assert_abs_diff_eq!(wrap_rad(0.0), 0.0);
        assert_abs_diff_eq!(wrap_rad(PI), PI);
        assert_abs_diff_eq!(wrap_rad(-PI), PI);
        assert_abs_diff_eq!(wrap_rad(2.5 * PI), 0.5 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_rad(PI + 0.1), -PI + 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_rad(-TAU - 0.5), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_wrap_deg_and_360() {
        assert_abs_diff_eq!(wrap_deg(190.0), -170.0);
        assert_abs_diff_eq!(wrap_deg(-180.0), 180.0);
        assert_abs_diff_eq!(wrap_360(-10.0), 350.0);
        assert_abs_diff_eq!(wrap_360(720.0), 0.0);
        assert!(wrap_360(-1e-300) < 360.0);
    }

    #[test]
    fn test_angle_diff_takes_short_way() {
        // 170° to −170° is +20°, not −340°
        let d = angle_diff_rad((-170.0f64).to_radians(), 170.0f64.to_radians());
        assert_abs_diff_eq!(d, 20.0f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_limit_boundary_inclusive() {
        assert!(limit_active(PI));
        assert!(limit_active(-PI));
        assert!(!limit_active(PI + 1e-9));
        assert!(!limit_active(-4.0));
    }

    #[test]
    fn test_clamp_high_before_low() {
        assert_eq!(clamp_to_limits(2.0, -1.0, 1.0), (1.0, true));
        assert_eq!(clamp_to_limits(-2.0, -1.0, 1.0), (-1.0, true));
        assert_eq!(clamp_to_limits(1.0, -1.0, 1.0), (1.0, false));
        // inverted limits: both violated, high wins
        assert_eq!(clamp_to_limits(0.0, 0.5, -0.5), (-0.5, true));
        // inactive bounds never clamp
        assert_eq!(clamp_to_limits(3.0, -10.0, 10.0), (3.0, false));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use fuzz_harness::prelude::*;

    proptest! {
        #![proptest_config(FuzzConfig::new().cases(512).to_proptest_config())]

        #[test]
        fn wrap_rad_stays_in_half_open_interval(a in any_angle_rad()) {
            let w = wrap_rad(a);
            prop_assert!(w > -PI && w <= PI, "{} wrapped to {}", a, w);
        }

        #[test]
        fn wrap_rad_is_idempotent(a in any_angle_rad()) {
            let w = wrap_rad(a);
            prop_assert!((wrap_rad(w) - w).abs() < 1e-12);
        }

        #[test]
        fn wrap_360_stays_in_range(a in any_angle_rad()) {
            let w = wrap_360(a.to_degrees());
            prop_assert!((0.0..360.0).contains(&w));
        }
    }
}
