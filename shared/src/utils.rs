use crate::math::Vec3;

/// Minimum planar length for a direction to define a yaw.
const YAW_EPS: f32 = 1.0e-6;

/// Yaw (radians) of a planar direction, with yaw 0 facing -Z.
pub fn yaw_from_xz(x: f32, z: f32) -> Option<f32> {
    if x * x + z * z > YAW_EPS {
        return Some((-x).atan2(-z));
    }

    None
}

/// Camera-relative planar basis `(forward, right)` for a camera yaw.
///
/// Yaw 0 looks down -Z with +X to the right.
pub fn camera_basis(yaw: f32) -> (Vec3, Vec3) {
    let (sin, cos) = yaw.sin_cos();
    let forward = Vec3::new(-sin, 0.0, -cos);
    let right = Vec3::new(cos, 0.0, -sin);
    (forward, right)
}

/// Planar movement direction from stick axes, clamped to unit length.
pub fn planar_direction(forward_axis: f32, strafe_axis: f32, yaw: f32) -> Vec3 {
    let (forward, right) = camera_basis(yaw);
    let v = forward * forward_axis + right * strafe_axis;
    let len_sq = v.norm_squared();
    if len_sq > 1.0 { v / len_sq.sqrt() } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn basis_at_zero_yaw() {
        let (forward, right) = camera_basis(0.0);
        assert_relative_eq!(forward, Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(right, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn basis_is_right_handed_after_quarter_turn() {
        let (forward, right) = camera_basis(FRAC_PI_2);
        assert_relative_eq!(forward, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1.0e-6);
        assert_relative_eq!(right, Vec3::new(0.0, 0.0, -1.0), epsilon = 1.0e-6);
    }

    #[test]
    fn yaw_roundtrips_with_basis() {
        let (forward, _) = camera_basis(0.8);
        let yaw = yaw_from_xz(forward.x, forward.z).expect("non-zero");
        assert_relative_eq!(yaw, 0.8, epsilon = 1.0e-5);
        assert!(yaw_from_xz(0.0, 0.0).is_none());
    }

    #[test]
    fn diagonal_input_is_normalized() {
        let v = planar_direction(1.0, 1.0, 0.0);
        assert_relative_eq!(v.norm(), 1.0, epsilon = 1.0e-6);
        let half = planar_direction(0.5, 0.0, 0.0);
        assert_relative_eq!(half.norm(), 0.5);
    }
}
