//! Coordinate frame algebra
//!
//! Frames are NED-style (x forward/north, y right/east, z down). A frame matrix
//! maps child coordinates into its parent: `p_parent = M · p_child`. Chains are
//! composed top-down, `world ← body ← gimbal ← child gimbal`.

use crate::{Mat3, Mat4, Vec3};
use nalgebra::Rotation3;

/// Body → parent rotation, applied roll first then pitch then yaw
/// (`Rz(yaw) · Ry(pitch) · Rx(roll)`).
pub fn euler_rotation(roll: f64, pitch: f64, yaw: f64) -> Mat3 {
    Rotation3::from_euler_angles(roll, pitch, yaw).into_inner()
}

/// Homogeneous matrix from a rotation and a translation
pub fn frame_matrix(rotation: &Mat3, translation: &Vec3) -> Mat4 {
    let mut m = Mat4::identity();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// `parent · local`
pub fn compose(parent: &Mat4, local: &Mat4) -> Mat4 {
    parent * local
}

/// Rotation block of a frame matrix
pub fn rotation_of(m: &Mat4) -> Mat3 {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Translation column of a frame matrix
pub fn translation_of(m: &Mat4) -> Vec3 {
    m.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Map a point from the child frame into the parent frame
pub fn transform_point(m: &Mat4, p: &Vec3) -> Vec3 {
    rotation_of(m) * p + translation_of(m)
}

/// Map a direction from the child frame into the parent frame (no translation)
pub fn transform_vector(m: &Mat4, v: &Vec3) -> Vec3 {
    rotation_of(m) * v
}

/// Map a direction from the parent frame back into the child frame.
/// Frame rotations are orthonormal so the transpose is the inverse.
pub fn inverse_rotate_vector(m: &Mat4, v: &Vec3) -> Vec3 {
    rotation_of(m).transpose() * v
}

/// Azimuth `atan2(y, x)` and elevation `atan2(−z, ground range)` of a NED vector
pub fn az_el_of(v: &Vec3) -> (f64, f64) {
    let ground = (v.x * v.x + v.y * v.y).sqrt();
    (v.y.atan2(v.x), (-v.z).atan2(ground))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_yaw_rotates_boresight_east() {
        let r = euler_rotation(0.0, 0.0, FRAC_PI_2);
        let v = r * Vec3::x();
        assert_abs_diff_eq!(v, Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_positive_pitch_points_up() {
        let r = euler_rotation(0.0, 0.3, 0.0);
        let (_, el) = az_el_of(&(r * Vec3::x()));
        assert_abs_diff_eq!(el, 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_compose_chain() {
        let body = frame_matrix(&euler_rotation(0.0, 0.0, FRAC_PI_2), &Vec3::new(100.0, 0.0, 0.0));
        let mount = frame_matrix(&Mat3::identity(), &Vec3::new(2.0, 0.0, 0.0));
        let chain = compose(&body, &mount);
        // mount origin is 2 m ahead of the body, body faces east
        let p = transform_point(&chain, &Vec3::zeros());
        assert_abs_diff_eq!(p, Vec3::new(100.0, 2.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_rotation_round_trips() {
        let m = frame_matrix(&euler_rotation(0.2, -0.4, 1.1), &Vec3::new(5.0, 6.0, 7.0));
        let v = Vec3::new(1.0, -2.0, 0.5);
        let back = inverse_rotate_vector(&m, &transform_vector(&m, &v));
        assert_abs_diff_eq!(back, v, epsilon = 1e-12);
    }
}
