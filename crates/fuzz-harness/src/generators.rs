//! Domain generators for property-based testing
//!
//! All angular generators are in radians unless the name says otherwise.

use proptest::prelude::*;
use std::f64::consts::PI;

// ============================================================================
// Angle Generators
// ============================================================================

/// Any finite angle, including many turns of accumulated wraparound
pub fn any_angle_rad() -> impl Strategy<Value = f64> + Clone {
    -1000.0 * PI..1000.0 * PI
}

/// Angle already in the principal interval
pub fn principal_angle_rad() -> impl Strategy<Value = f64> + Clone {
    -PI..=PI
}

/// Azimuth in degrees (0-360)
pub fn azimuth_deg() -> impl Strategy<Value = f64> {
    0.0f64..360.0
}

/// Elevation in radians (−90° to 90°)
pub fn elevation_rad() -> impl Strategy<Value = f64> {
    -PI / 2.0..=PI / 2.0
}

/// Small positive overshoot past a limit (ε > 0)
pub fn overshoot_rad() -> impl Strategy<Value = f64> {
    1e-9f64..1.0
}

/// Symmetric limit pair `[−w, w]` with `w` in (0, π]
pub fn symmetric_limits() -> impl Strategy<Value = (f64, f64)> {
    (0.01f64..=PI).prop_map(|w| (-w, w))
}

// ============================================================================
// Rate / Time Generators
// ============================================================================

/// Servo max rate (rad/s)
pub fn max_rate() -> impl Strategy<Value = f64> + Clone {
    0.0f64..10.0
}

/// Commanded rate, possibly far beyond any max rate (rad/s)
pub fn cmd_rate() -> impl Strategy<Value = f64> + Clone {
    -100.0f64..100.0
}

/// Frame time step (s), includes zero
pub fn time_step() -> impl Strategy<Value = f64> {
    prop_oneof![
        1 => Just(0.0),
        9 => 1e-4f64..1.0,
    ]
}

/// Per-axis triple
pub fn triple<S>(s: S) -> impl Strategy<Value = [f64; 3]>
where
    S: Strategy<Value = f64> + Clone,
{
    (s.clone(), s.clone(), s).prop_map(|(a, b, c)| [a, b, c])
}

// ============================================================================
// RF Generators
// ============================================================================

/// Carrier frequency (Hz), HF to Ka band
pub fn frequency_hz() -> impl Strategy<Value = f64> {
    3.0e6f64..40.0e9
}

/// Receiver bandwidth (Hz), valid range
pub fn bandwidth_hz() -> impl Strategy<Value = f64> {
    1.0f64..1.0e9
}

/// Slant range (m), including the near field
pub fn range_m() -> impl Strategy<Value = f64> {
    prop_oneof![
        1 => 0.0f64..=1.0,
        9 => 1.0f64..500_000.0,
    ]
}

/// Transmit power (W)
pub fn power_w() -> impl Strategy<Value = f64> {
    0.0f64..1.0e6
}

// ============================================================================
// Composite Generators
// ============================================================================

/// Gimbal command: (position triple, rate triple)
pub fn servo_command() -> impl Strategy<Value = ([f64; 3], [f64; 3])> {
    (triple(any_angle_rad()), triple(cmd_rate()))
}
