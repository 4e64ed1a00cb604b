/*!
Math aliases and the TRS transform shared by scene traversal, collider synthesis and the
character controller.

Notes
- Units are meters, the world is Y-up.
- `Transform` keeps non-uniform scale separate from the rigid part because colliders only
  accept isometries; scale is baked into shape dimensions instead.
*/

use nalgebra as na;

use crate::constants::DIST_EPS;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;
pub type Mat4 = na::Matrix4<f32>;

/// Translation, rotation and (possibly non-uniform) scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity(), Vec3::new(1.0, 1.0, 1.0))
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    #[inline]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rigid part only, for use as a collider pose.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(na::Translation3::from(self.translation), self.rotation)
    }

    /// Homogeneous `T * R * S` matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Split an affine matrix back into translation, rotation and scale.
    ///
    /// Returns `None` for non-finite input or when any axis has (near) zero scale, which is how
    /// hidden instances are usually encoded.
    /// A mirrored basis is folded into a negative X scale so the rotation stays proper.
    pub fn decompose(m: &Mat4) -> Option<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let translation = Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
        let cx = Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]);
        let cy = Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]);
        let cz = Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]);

        let mut scale = Vec3::new(cx.norm(), cy.norm(), cz.norm());
        if scale.x <= DIST_EPS || scale.y <= DIST_EPS || scale.z <= DIST_EPS {
            return None;
        }

        let mut basis = na::Matrix3::from_columns(&[cx / scale.x, cy / scale.y, cz / scale.z]);
        if basis.determinant() < 0.0 {
            scale.x = -scale.x;
            basis.set_column(0, &(-cx / cx.norm()));
        }

        let rotation =
            Quat::from_rotation_matrix(&na::Rotation3::from_matrix_unchecked(basis));

        Some(Self {
            translation,
            rotation,
            scale,
        })
    }
}

/// Planar (XZ) squared distance between two points (meters^2).
#[inline]
pub fn planar_distance_sq(a: &Vec3, b: &Vec3) -> f32 {
    let x = b.x - a.x;
    let z = b.z - a.z;
    x * x + z * z
}

/// Keep only the horizontal components.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
