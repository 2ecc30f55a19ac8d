//! Frame Math Library
//!
//! Leaf utilities shared by the gimbal, RF and track crates:
//! - Angle wraparound and servo limit clamping
//! - Homogeneous 4x4 frame matrices (gimbal → body → world)
//! - NED azimuth/elevation helpers
//! - Physical constants

pub mod angles;
pub mod transform;

pub use angles::{
    angle_diff_rad, clamp_to_limits, limit_active, wrap_360, wrap_deg, wrap_rad, Axis,
};
pub use transform::{
    az_el_of, compose, euler_rotation, frame_matrix, inverse_rotate_vector, rotation_of,
    transform_point, transform_vector, translation_of,
};

/// 3-vector in meters, m/s or radians depending on context
pub type Vec3 = nalgebra::Vector3<f64>;
/// 3x3 rotation
pub type Mat3 = nalgebra::Matrix3<f64>;
/// 4x4 homogeneous frame transform
pub type Mat4 = nalgebra::Matrix4<f64>;

pub const DEG2RAD: f64 = std::f64::consts::PI / 180.0;
pub const RAD2DEG: f64 = 180.0 / std::f64::consts::PI;

/// Boltzmann constant (J/K)
pub const BOLTZMANN: f64 = 1.380_649e-23;

/// Speed of light (m/s)
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Mean earth radius (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
