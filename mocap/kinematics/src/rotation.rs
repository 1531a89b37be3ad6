//! Elementary axis rotations.
//!
//! Channel labels are resolved to [`Axis`] once at tree-load time, so the
//! per-frame path is a closed-enum dispatch with no string comparisons.

use mocap_bvh::Axis;
use nalgebra::{Matrix3, Rotation3, Vector3};

/// Rotation matrix for an angle (radians) about a principal axis.
pub fn rotation_about(axis: Axis, angle: f64) -> Matrix3<f64> {
    let axis = match axis {
        Axis::X => Vector3::x_axis(),
        Axis::Y => Vector3::y_axis(),
        Axis::Z => Vector3::z_axis(),
    };
    Rotation3::from_axis_angle(&axis, angle).into_inner()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_quarter_turns() {
        let v = Vector3::new(0.0, 1.0, 0.0);

        let about_z = rotation_about(Axis::Z, FRAC_PI_2) * v;
        assert_relative_eq!(about_z.x, -1.0, epsilon = 1e-12);
        assert_relative_eq!(about_z.y, 0.0, epsilon = 1e-12);

        let about_x = rotation_about(Axis::X, FRAC_PI_2) * v;
        assert_relative_eq!(about_x.z, 1.0, epsilon = 1e-12);

        // Rotation about the axis itself is a no-op.
        let about_y = rotation_about(Axis::Y, FRAC_PI_2) * v;
        assert_relative_eq!(about_y.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_angle_is_identity() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let m = rotation_about(axis, 0.0);
            assert_relative_eq!(m, Matrix3::identity(), epsilon = 1e-15);
        }
    }
}
